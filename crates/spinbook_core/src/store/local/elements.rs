//! Element storage operations backed by redb.

use super::tables::ELEMENTS;
use super::LocalStore;
use crate::error::CatalogError;
use crate::models::element::{Element, ElementPatch};
use crate::store::{CatalogStore, ChangeStream, ElementChange, StreamEvent};
use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable};
use tokio::sync::{broadcast, mpsc};

/// Buffer for one subscription; the engine drains batches promptly.
const STREAM_CHANNEL_CAPACITY: usize = 32;

fn deserialize_element(bytes: &[u8]) -> Result<Element, CatalogError> {
    Ok(bincode::deserialize(bytes)?)
}

impl LocalStore {
    fn read_all_elements(&self) -> Result<Vec<Element>, CatalogError> {
        let read_txn = self.db().begin_read()?;
        let elements = read_txn.open_table(ELEMENTS)?;
        let mut rows = Vec::new();
        for item in elements.iter()? {
            let (_, value) = item?;
            rows.push(deserialize_element(value.value())?);
        }
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    fn read_element(&self, id: &str) -> Result<Option<Element>, CatalogError> {
        let read_txn = self.db().begin_read()?;
        let elements = read_txn.open_table(ELEMENTS)?;
        match elements.get(id)? {
            Some(value) => Ok(Some(deserialize_element(value.value())?)),
            None => Ok(None),
        }
    }

    fn insert_element(&self, element: &Element) -> Result<(), CatalogError> {
        let encoded = bincode::serialize(element)?;
        let write_txn = self.db().begin_write()?;
        {
            let mut elements = write_txn.open_table(ELEMENTS)?;
            if elements.get(element.id.as_str())?.is_some() {
                return Err(CatalogError::Duplicate(element.id.clone()));
            }
            elements.insert(element.id.as_str(), encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn patch_element(&self, id: &str, patch: &ElementPatch) -> Result<Element, CatalogError> {
        let write_txn = self.db().begin_write()?;
        let patched = {
            let mut elements = write_txn.open_table(ELEMENTS)?;
            let Some(old_guard) = elements.get(id)? else {
                return Err(CatalogError::NotFound);
            };
            let mut element = deserialize_element(old_guard.value())?;
            drop(old_guard);

            element.apply_patch(patch);
            let encoded = bincode::serialize(&element)?;
            elements.insert(id, encoded.as_slice())?;
            element
        };
        write_txn.commit()?;
        Ok(patched)
    }

    fn remove_element(&self, id: &str) -> Result<Element, CatalogError> {
        let write_txn = self.db().begin_write()?;
        let removed = {
            let mut elements = write_txn.open_table(ELEMENTS)?;
            let Some(old_guard) = elements.remove(id)? else {
                return Err(CatalogError::NotFound);
            };
            deserialize_element(old_guard.value())?
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

#[async_trait]
impl CatalogStore for LocalStore {
    async fn fetch_all(&self) -> Result<Vec<Element>, CatalogError> {
        self.read_all_elements()
    }

    async fn fetch(&self, id: &str) -> Result<Option<Element>, CatalogError> {
        self.read_element(id)
    }

    async fn exists(&self, id: &str) -> Result<bool, CatalogError> {
        Ok(self.read_element(id)?.is_some())
    }

    async fn insert(&self, element: &Element) -> Result<(), CatalogError> {
        self.insert_element(element)?;
        self.publish(vec![ElementChange::added(element.clone())]);
        Ok(())
    }

    async fn patch(&self, id: &str, patch: &ElementPatch) -> Result<(), CatalogError> {
        let patched = self.patch_element(id, patch)?;
        self.publish(vec![ElementChange::modified(patched)]);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), CatalogError> {
        let removed = self.remove_element(id)?;
        self.publish(vec![ElementChange::removed(removed)]);
        Ok(())
    }

    async fn subscribe(&self) -> Result<ChangeStream, CatalogError> {
        // Register for live changes before snapshotting so nothing slips
        // between the two; duplicates are absorbed by the mirror's id dedup.
        let mut live = self.change_receiver();
        let snapshot = self.read_all_elements()?;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let initial: Vec<ElementChange> =
                snapshot.into_iter().map(ElementChange::added).collect();
            if tx.send(StreamEvent::Batch(initial)).await.is_err() {
                return;
            }
            loop {
                match live.recv().await {
                    Ok(batch) => {
                        if tx.send(StreamEvent::Batch(batch)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        let message =
                            format!("catalog change stream lagged by {} batches", skipped);
                        if tx.send(StreamEvent::Error(message)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }
}
