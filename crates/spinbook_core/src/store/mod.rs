//! Store abstractions and local reference implementations.
//!
//! The sync engine and mutation pipeline only see these traits; the `local`
//! module provides redb/filesystem-backed implementations suitable for a
//! self-hosted deployment and for tests.

/// redb-backed catalog + profile store.
pub mod local;
/// Filesystem media store.
pub mod media;
/// Notification surface implementations.
pub mod notify;

use crate::error::CatalogError;
use crate::models::element::{Element, ElementPatch};
use crate::models::user::{FolderKind, UserProfile};
use async_trait::async_trait;
use tokio::sync::mpsc;

pub use local::LocalStore;
pub use media::{FsMediaStore, MediaKind};
pub use notify::{LogNotifier, Notifier};

/// Classification of a single record change in a delta batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One changed record, as delivered by a store subscription.
#[derive(Debug, Clone)]
pub struct ElementChange {
    pub kind: ChangeKind,
    pub element: Element,
}

impl ElementChange {
    pub fn added(element: Element) -> Self {
        Self {
            kind: ChangeKind::Added,
            element,
        }
    }

    pub fn modified(element: Element) -> Self {
        Self {
            kind: ChangeKind::Modified,
            element,
        }
    }

    pub fn removed(element: Element) -> Self {
        Self {
            kind: ChangeKind::Removed,
            element,
        }
    }
}

/// Events delivered over a catalog subscription.
///
/// Errors are delivered in-band so the consumer can fail open: surface the
/// message, keep the last-known-good state, and wait for more batches.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Batch(Vec<ElementChange>),
    Error(String),
}

/// Receiving half of a catalog subscription.
///
/// The first delivered batch is the store's current contents as `Added`
/// changes, ordered by name ascending.
pub type ChangeStream = mpsc::Receiver<StreamEvent>;

/// Document store holding the element catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All elements, ordered by name ascending.
    async fn fetch_all(&self) -> Result<Vec<Element>, CatalogError>;

    /// One element by id.
    async fn fetch(&self, id: &str) -> Result<Option<Element>, CatalogError>;

    /// Whether an element id is taken.
    async fn exists(&self, id: &str) -> Result<bool, CatalogError>;

    /// Insert a new element; fails with [`CatalogError::Duplicate`] when the
    /// id is already present.
    async fn insert(&self, element: &Element) -> Result<(), CatalogError>;

    /// Patch an existing element's fields, keeping its id.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] when the id is absent.
    async fn patch(&self, id: &str, patch: &ElementPatch) -> Result<(), CatalogError>;

    /// Remove an element by id.
    ///
    /// # Errors
    /// [`CatalogError::NotFound`] when the id is absent.
    async fn remove(&self, id: &str) -> Result<(), CatalogError>;

    /// Open a change stream over the catalog.
    async fn subscribe(&self) -> Result<ChangeStream, CatalogError>;
}

/// Content store for element media (photos/videos).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under a collision-resistant generated name.
    ///
    /// # Returns
    /// The retrieval URL for the stored object.
    async fn upload(
        &self,
        kind: MediaKind,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, CatalogError>;

    /// Delete an object by its retrieval URL.
    ///
    /// # Returns
    /// `Ok(true)` when an object was deleted, `Ok(false)` when there was
    /// nothing at that URL (a benign outcome for best-effort cleanup).
    async fn delete(&self, url: &str) -> Result<bool, CatalogError>;
}

/// Store holding per-user profile records and their folder id-sets.
///
/// Folder mutations are single-id set operations applied atomically on the
/// store side; callers never bulk-replace a folder array.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch(&self, uid: &str) -> Result<Option<UserProfile>, CatalogError>;

    /// Fetch a profile, creating an empty one when missing.
    async fn ensure(&self, uid: &str, username: &str) -> Result<UserProfile, CatalogError>;

    /// Add one element id to one folder.
    async fn folder_add(
        &self,
        uid: &str,
        kind: FolderKind,
        element_id: &str,
    ) -> Result<(), CatalogError>;

    /// Remove one element id from one folder.
    async fn folder_remove(
        &self,
        uid: &str,
        kind: FolderKind,
        element_id: &str,
    ) -> Result<(), CatalogError>;
}
