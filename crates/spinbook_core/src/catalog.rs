//! Mutation pipeline and observable catalog surface.
//!
//! [`Catalog`] is the single logical owner the presentation layer talks to:
//! it drives the sync engine, runs create/update/delete pipelines against
//! the stores, and exposes its state as watch channels. Every failure is
//! surfaced twice — as the returned `Err` and on the shared last-error slot —
//! and nothing here retries; a failed upload or write needs a resubmit.

use crate::error::CatalogError;
use crate::filter::FilterState;
use crate::models::element::{derive_element_id, Element, ElementPatch};
use crate::models::level::LevelFilter;
use crate::models::user::{FolderKind, FolderSets, FolderStatus};
use crate::store::{CatalogStore, MediaKind, MediaStore, Notifier, ProfileStore};
use crate::sync::{Projector, SyncEngine};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

/// Media handed to the mutation pipeline.
#[derive(Debug, Clone)]
pub enum MediaSource {
    /// Raw bytes to upload under a collision-resistant generated name.
    Upload { file_name: String, bytes: Vec<u8> },
    /// An already-hosted URL, used as-is (no upload step).
    Remote(String),
}

/// Payload for creating a catalog element.
#[derive(Debug, Clone)]
pub struct NewElement {
    pub name: String,
    pub description: String,
    pub level: String,
    pub level_number: String,
    pub image: Option<MediaSource>,
    pub video: Option<MediaSource>,
}

/// Payload for updating a catalog element in place.
///
/// `current_*` carry the URLs on record before the update so replaced media
/// can be cleaned up best-effort.
#[derive(Debug, Clone)]
pub struct ElementUpdate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub level: String,
    pub level_number: String,
    pub new_image: Option<MediaSource>,
    pub current_image: String,
    pub new_video: Option<MediaSource>,
    pub current_video: String,
}

/// Observable catalog owner wired over the store seams.
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    media: Arc<dyn MediaStore>,
    profiles: Arc<dyn ProfileStore>,
    engine: Arc<SyncEngine>,
    projector: Arc<Projector>,
    loading_tx: watch::Sender<bool>,
    error_tx: Arc<watch::Sender<Option<String>>>,
    selected_tx: watch::Sender<Option<Element>>,
    deletions_tx: broadcast::Sender<String>,
    folder_sets: Mutex<Option<FolderSets>>,
}

impl Catalog {
    /// Wire a catalog over its collaborators.
    ///
    /// `cooldown` is the minimum spacing between visible new-element alerts.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        media: Arc<dyn MediaStore>,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn Notifier>,
        cooldown: Duration,
    ) -> Self {
        let projector = Arc::new(Projector::new());
        let (error_tx, _) = watch::channel(None);
        let error_tx = Arc::new(error_tx);
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            notifier,
            projector.clone(),
            error_tx.clone(),
            cooldown,
        ));
        let (loading_tx, _) = watch::channel(false);
        let (selected_tx, _) = watch::channel(None);
        let (deletions_tx, _) = broadcast::channel(16);
        Self {
            store,
            media,
            profiles,
            engine,
            projector,
            loading_tx,
            error_tx,
            selected_tx,
            deletions_tx,
            folder_sets: Mutex::new(None),
        }
    }

    // --- observables -----------------------------------------------------

    /// Catalog mirror, name ascending.
    pub fn elements(&self) -> watch::Receiver<Vec<Element>> {
        self.engine.elements()
    }

    /// General-browser view (search + level facet).
    pub fn filtered(&self) -> watch::Receiver<Vec<Element>> {
        self.projector.filtered()
    }

    /// Folder-page view; empty while no folder is selected.
    pub fn folder_view(&self) -> watch::Receiver<Vec<Element>> {
        self.projector.folder_view()
    }

    /// Currently selected element (detail view).
    pub fn selected(&self) -> watch::Receiver<Option<Element>> {
        self.selected_tx.subscribe()
    }

    /// Whether a batch operation is in flight.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    /// Last error string; persists until cleared or a new operation starts.
    pub fn last_error(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Ids of successfully deleted elements, for navigation.
    pub fn deletion_events(&self) -> broadcast::Receiver<String> {
        self.deletions_tx.subscribe()
    }

    pub fn clear_error(&self) {
        self.error_tx.send_replace(None);
    }

    pub fn clear_selected(&self) {
        self.selected_tx.send_replace(None);
    }

    // --- subscriptions and views -----------------------------------------

    /// Start the realtime subscription. A call while one is active is a
    /// no-op.
    pub async fn subscribe(&self) -> Result<(), CatalogError> {
        let result = self.engine.subscribe().await;
        if let Err(err) = &result {
            self.record_failure(err);
        }
        result
    }

    /// Stop the realtime subscription; the mirror keeps its last state.
    pub async fn unsubscribe(&self) {
        self.engine.unsubscribe().await;
    }

    /// Replace the search text and level facet for the browser view.
    pub fn update_filters(&self, search: &str, level: LevelFilter) {
        self.projector.set_filter(
            FilterState::new(search, level),
            &self.engine.current(),
        );
    }

    /// Select (or clear) the active folder page.
    pub fn select_folder(&self, selection: Option<(FolderKind, LevelFilter)>) {
        self.projector
            .select_folder(selection, &self.engine.current());
    }

    /// Replace the cached folder id-sets pushed in by the auth/profile
    /// collaborator. `None` marks folder data as not loaded.
    pub fn update_folder_sets(&self, sets: Option<FolderSets>) {
        *self.lock_folder_sets() = sets.clone();
        self.projector
            .set_folder_sets(sets, &self.engine.current());
    }

    /// Resolve a folder against the current mirror (pull-style API).
    pub fn folder_elements(&self, kind: FolderKind, level: &LevelFilter) -> Vec<Element> {
        let sets = self.lock_folder_sets().clone();
        crate::folders::elements_in_folder(&self.engine.current(), sets.as_ref(), kind, level)
    }

    /// Which folders contain `element_id`, per the cached sets.
    pub fn element_folder_status(&self, element_id: &str) -> FolderStatus {
        self.lock_folder_sets()
            .as_ref()
            .map(|sets| sets.status(element_id))
            .unwrap_or_default()
    }

    // --- batch operations -------------------------------------------------

    /// One-shot fetch replacing the whole mirror.
    pub async fn refresh_all(&self) -> Result<(), CatalogError> {
        self.loading_tx.send_replace(true);
        self.error_tx.send_replace(None);
        let result = self.engine.refresh().await;
        if let Err(err) = &result {
            self.record_failure(err);
        }
        self.loading_tx.send_replace(false);
        result
    }

    /// Load one element into the detail slot.
    ///
    /// The previous selection is cleared first; a missing id leaves the
    /// selection empty without raising an error.
    pub async fn fetch_element(&self, id: &str) -> Result<Option<Element>, CatalogError> {
        self.loading_tx.send_replace(true);
        self.error_tx.send_replace(None);
        self.selected_tx.send_replace(None);
        let result = self.store.fetch(id).await;
        match &result {
            Ok(element) => {
                self.selected_tx.send_replace(element.clone());
            }
            Err(err) => self.record_failure(err),
        }
        self.loading_tx.send_replace(false);
        result
    }

    /// Create a new element, uploading media first.
    ///
    /// # Returns
    /// The derived id of the new record.
    ///
    /// # Errors
    /// A media upload failure or duplicate derived id aborts the operation
    /// before anything is written to the catalog store.
    pub async fn create_element(&self, new: NewElement) -> Result<String, CatalogError> {
        self.loading_tx.send_replace(true);
        self.error_tx.send_replace(None);
        let result = self.create_inner(new).await;
        if let Err(err) = &result {
            self.record_failure(err);
        }
        self.loading_tx.send_replace(false);
        result
    }

    async fn create_inner(&self, new: NewElement) -> Result<String, CatalogError> {
        let image = match new.image {
            Some(source) => self.resolve_media(MediaKind::Image, source).await?,
            None => String::new(),
        };
        let video = match new.video {
            Some(source) => self.resolve_media(MediaKind::Video, source).await?,
            None => String::new(),
        };

        let id = derive_element_id(&new.name);
        if self.store.exists(&id).await? {
            return Err(CatalogError::Duplicate(id));
        }

        let element = Element {
            id: id.clone(),
            name: new.name,
            level: new.level,
            level_number: new.level_number,
            description: new.description,
            image,
            video,
        };
        self.store.insert(&element).await?;

        self.refresh_best_effort().await;
        Ok(id)
    }

    /// Patch an element in place, replacing media when new sources are
    /// given. Replaced media objects are deleted best-effort.
    pub async fn update_element(&self, update: ElementUpdate) -> Result<(), CatalogError> {
        self.loading_tx.send_replace(true);
        self.error_tx.send_replace(None);
        let result = self.update_inner(update).await;
        if let Err(err) = &result {
            self.record_failure(err);
        }
        self.loading_tx.send_replace(false);
        result
    }

    async fn update_inner(&self, update: ElementUpdate) -> Result<(), CatalogError> {
        let mut image = update.current_image.clone();
        if let Some(source) = update.new_image {
            let url = self.resolve_media(MediaKind::Image, source).await?;
            if !update.current_image.is_empty() && update.current_image != url {
                self.discard_media(&update.current_image, "replaced image")
                    .await;
            }
            image = url;
        }

        let mut video = update.current_video.clone();
        if let Some(source) = update.new_video {
            let url = self.resolve_media(MediaKind::Video, source).await?;
            if !update.current_video.is_empty() && update.current_video != url {
                self.discard_media(&update.current_video, "replaced video")
                    .await;
            }
            video = url;
        }

        let patch = ElementPatch {
            name: update.name,
            level: update.level,
            level_number: update.level_number,
            description: update.description,
            image,
            video,
        };
        self.store.patch(&update.id, &patch).await?;

        self.refresh_best_effort().await;
        // Refresh the detail view for this id.
        let refreshed = self.store.fetch(&update.id).await?;
        self.selected_tx.send_replace(refreshed);
        Ok(())
    }

    /// Delete an element, its media (best-effort), and its record.
    pub async fn delete_element(&self, id: &str) -> Result<(), CatalogError> {
        self.loading_tx.send_replace(true);
        self.error_tx.send_replace(None);
        let result = self.delete_inner(id).await;
        if let Err(err) = &result {
            self.record_failure(err);
        }
        self.loading_tx.send_replace(false);
        result
    }

    async fn delete_inner(&self, id: &str) -> Result<(), CatalogError> {
        let element = self.store.fetch(id).await?.ok_or(CatalogError::NotFound)?;

        // Media failures are warnings; the record deletion proceeds.
        self.discard_media(&element.image, "image").await;
        self.discard_media(&element.video, "video").await;

        self.store.remove(id).await?;

        let selected_matches = self
            .selected_tx
            .borrow()
            .as_ref()
            .is_some_and(|selected| selected.id == id);
        if selected_matches {
            self.selected_tx.send_replace(None);
        }
        self.refresh_best_effort().await;
        let _ = self.deletions_tx.send(id.to_string());
        Ok(())
    }

    /// Flip one element in or out of a user folder.
    ///
    /// Read-modify-write against the cached sets, then the store's atomic
    /// per-folder set op; the cache is updated on success and may transiently
    /// disagree with the server until the next profile refresh.
    ///
    /// # Returns
    /// `true` when the element is in the folder after the toggle.
    pub async fn toggle_folder(
        &self,
        uid: &str,
        kind: FolderKind,
        element_id: &str,
    ) -> Result<bool, CatalogError> {
        self.error_tx.send_replace(None);
        let in_folder = {
            let guard = self.lock_folder_sets();
            match guard.as_ref() {
                Some(sets) => sets.contains(kind, element_id),
                None => {
                    drop(guard);
                    let err =
                        CatalogError::BadRequest("folder data is not loaded yet".to_string());
                    self.record_failure(&err);
                    return Err(err);
                }
            }
        };

        let result = if in_folder {
            self.profiles.folder_remove(uid, kind, element_id).await
        } else {
            self.profiles.folder_add(uid, kind, element_id).await
        };
        if let Err(err) = result {
            self.record_failure(&err);
            return Err(err);
        }

        let updated = {
            let mut sets = self.lock_folder_sets();
            if let Some(sets) = sets.as_mut() {
                if in_folder {
                    sets.set_mut(kind).remove(element_id);
                } else {
                    sets.set_mut(kind).insert(element_id.to_string());
                }
            }
            sets.clone()
        };
        self.projector
            .set_folder_sets(updated, &self.engine.current());
        Ok(!in_folder)
    }

    // --- internals ---------------------------------------------------------

    fn lock_folder_sets(&self) -> std::sync::MutexGuard<'_, Option<FolderSets>> {
        self.folder_sets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_failure(&self, err: &CatalogError) {
        self.error_tx.send_replace(Some(err.to_string()));
    }

    async fn resolve_media(
        &self,
        kind: MediaKind,
        source: MediaSource,
    ) -> Result<String, CatalogError> {
        match source {
            MediaSource::Upload { file_name, bytes } => {
                self.media.upload(kind, &file_name, &bytes).await
            }
            MediaSource::Remote(url) => Ok(url),
        }
    }

    async fn discard_media(&self, url: &str, context: &str) {
        if url.is_empty() {
            return;
        }
        match self.media.delete(url).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(target: "spinbook_core::catalog", "{} already absent: {}", context, url);
            }
            Err(err) => {
                warn!(
                    target: "spinbook_core::catalog",
                    "failed to delete {} {}: {}", context, url, err
                );
            }
        }
    }

    async fn refresh_best_effort(&self) {
        if let Err(err) = self.engine.refresh().await {
            warn!(
                target: "spinbook_core::catalog",
                "mirror refresh after mutation failed: {}", err
            );
            self.record_failure(&err);
        }
    }
}
