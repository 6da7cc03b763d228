//! Profile storage and folder set operations backed by redb.

use super::tables::PROFILES;
use super::LocalStore;
use crate::error::CatalogError;
use crate::models::user::{FolderKind, UserProfile};
use crate::store::ProfileStore;
use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable};

fn deserialize_profile(bytes: &[u8]) -> Result<UserProfile, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}

impl LocalStore {
    fn read_profile(&self, uid: &str) -> Result<Option<UserProfile>, CatalogError> {
        let read_txn = self.db().begin_read()?;
        let profiles = read_txn.open_table(PROFILES)?;
        match profiles.get(uid)? {
            Some(value) => Ok(Some(deserialize_profile(value.value())?)),
            None => Ok(None),
        }
    }

    /// Apply a single-id set mutation to one folder inside one write
    /// transaction. This is the atomic array-union/array-remove primitive;
    /// concurrent toggles on the same folder cannot lose each other's ids.
    fn mutate_folder(
        &self,
        uid: &str,
        kind: FolderKind,
        element_id: &str,
        insert: bool,
    ) -> Result<(), CatalogError> {
        let write_txn = self.db().begin_write()?;
        {
            let mut profiles = write_txn.open_table(PROFILES)?;
            let Some(old_guard) = profiles.get(uid)? else {
                return Err(CatalogError::NotFound);
            };
            let mut profile = deserialize_profile(old_guard.value())?;
            drop(old_guard);

            let set = profile.folders.set_mut(kind);
            if insert {
                set.insert(element_id.to_string());
            } else {
                set.remove(element_id);
            }

            let encoded = bincode::serialize(&profile)?;
            profiles.insert(uid, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for LocalStore {
    async fn fetch(&self, uid: &str) -> Result<Option<UserProfile>, CatalogError> {
        self.read_profile(uid)
    }

    async fn ensure(&self, uid: &str, username: &str) -> Result<UserProfile, CatalogError> {
        let write_txn = self.db().begin_write()?;
        let profile = {
            let mut profiles = write_txn.open_table(PROFILES)?;
            let existing = match profiles.get(uid)? {
                Some(value) => {
                    let existing = deserialize_profile(value.value())?;
                    drop(value);
                    Some(existing)
                }
                None => None,
            };
            match existing {
                Some(existing) => existing,
                None => {
                    let fresh = UserProfile::new(uid.to_string(), username.to_string());
                    let encoded = bincode::serialize(&fresh)?;
                    profiles.insert(uid, encoded.as_slice())?;
                    fresh
                }
            }
        };
        write_txn.commit()?;
        Ok(profile)
    }

    async fn folder_add(
        &self,
        uid: &str,
        kind: FolderKind,
        element_id: &str,
    ) -> Result<(), CatalogError> {
        self.mutate_folder(uid, kind, element_id, true)
    }

    async fn folder_remove(
        &self,
        uid: &str,
        kind: FolderKind,
        element_id: &str,
    ) -> Result<(), CatalogError> {
        self.mutate_folder(uid, kind, element_id, false)
    }
}
