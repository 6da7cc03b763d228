//! Local catalog + profile store backed by redb.
//!
//! Mutations publish single-change batches to subscribers, so an in-process
//! sync engine sees the same delta shape a remote document store would send.

mod elements;
mod profiles;
/// Table definitions.
pub mod tables;

use crate::error::CatalogError;
use crate::store::ElementChange;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use tables::{ELEMENTS, PROFILES, REDB_FILE_NAME};

/// Capacity of the change broadcast; slow subscribers observe a lag error
/// rather than blocking writers.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Handle to the local store. Cheap to clone via [`LocalStore::share`].
pub struct LocalStore {
    db: Arc<redb::Database>,
    changes: broadcast::Sender<Vec<ElementChange>>,
}

impl LocalStore {
    /// Open (or create) the store inside `data_dir` and initialize tables.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or redb fails to
    /// open/initialize the database.
    pub fn open(data_dir: &Path) -> Result<Self, CatalogError> {
        std::fs::create_dir_all(data_dir).map_err(|err| {
            CatalogError::StorageMessage(format!(
                "Failed to create data directory {}: {}",
                data_dir.display(),
                err
            ))
        })?;
        let db = redb::Database::create(data_dir.join(REDB_FILE_NAME))?;

        let write_txn = db.begin_write()?;
        write_txn.open_table(ELEMENTS)?;
        write_txn.open_table(PROFILES)?;
        write_txn.commit()?;

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            db: Arc::new(db),
            changes,
        })
    }

    /// Clone this handle for another subsystem in the same process.
    ///
    /// Shares the underlying redb instance and the change broadcast, so all
    /// handles feed the same subscribers.
    pub fn share(&self) -> Self {
        Self {
            db: self.db.clone(),
            changes: self.changes.clone(),
        }
    }

    pub(crate) fn db(&self) -> &redb::Database {
        &self.db
    }

    pub(crate) fn change_receiver(&self) -> broadcast::Receiver<Vec<ElementChange>> {
        self.changes.subscribe()
    }

    /// Publish a change batch to any live subscribers.
    pub(crate) fn publish(&self, batch: Vec<ElementChange>) {
        // No subscribers is fine; changes are only a live feed.
        let _ = self.changes.send(batch);
    }
}
