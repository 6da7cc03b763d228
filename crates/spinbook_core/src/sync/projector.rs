//! Derived views over the catalog mirror.

use crate::filter::{filter_elements, FilterState};
use crate::folders::elements_in_folder;
use crate::models::element::Element;
use crate::models::level::LevelFilter;
use crate::models::user::{FolderKind, FolderSets};
use std::sync::Mutex;
use tokio::sync::watch;

struct ViewState {
    filter: FilterState,
    folder: Option<(FolderKind, LevelFilter)>,
    folder_sets: Option<FolderSets>,
}

/// Owns the filtered and folder-scoped views of the mirror.
///
/// Both views are pure functions of (mirror, view state) and are re-derived
/// whenever either input changes: the sync engine calls [`recompute`] after
/// every mirror update, and the view-state setters recompute immediately.
///
/// [`recompute`]: Projector::recompute
pub struct Projector {
    view: Mutex<ViewState>,
    filtered_tx: watch::Sender<Vec<Element>>,
    folder_tx: watch::Sender<Vec<Element>>,
}

impl Projector {
    pub fn new() -> Self {
        let (filtered_tx, _) = watch::channel(Vec::new());
        let (folder_tx, _) = watch::channel(Vec::new());
        Self {
            view: Mutex::new(ViewState {
                filter: FilterState::default(),
                folder: None,
                folder_sets: None,
            }),
            filtered_tx,
            folder_tx,
        }
    }

    fn lock_view(&self) -> std::sync::MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Observable general-browser view.
    pub fn filtered(&self) -> watch::Receiver<Vec<Element>> {
        self.filtered_tx.subscribe()
    }

    /// Observable folder-page view; empty while no folder is selected.
    pub fn folder_view(&self) -> watch::Receiver<Vec<Element>> {
        self.folder_tx.subscribe()
    }

    /// Replace the search/level filter and re-derive against `mirror`.
    pub fn set_filter(&self, filter: FilterState, mirror: &[Element]) {
        self.lock_view().filter = filter;
        self.recompute(mirror);
    }

    /// Select (or clear) the active folder page and re-derive.
    pub fn select_folder(&self, selection: Option<(FolderKind, LevelFilter)>, mirror: &[Element]) {
        self.lock_view().folder = selection;
        self.recompute(mirror);
    }

    /// Replace the user's folder id-sets and re-derive.
    ///
    /// `None` means folder data is not loaded; the folder view is empty then.
    pub fn set_folder_sets(&self, sets: Option<FolderSets>, mirror: &[Element]) {
        self.lock_view().folder_sets = sets;
        self.recompute(mirror);
    }

    /// Re-derive both views from `mirror` under the current view state.
    pub fn recompute(&self, mirror: &[Element]) {
        let view = self.lock_view();
        self.filtered_tx
            .send_replace(filter_elements(mirror, &view.filter));
        let folder = match &view.folder {
            Some((kind, level)) => {
                elements_in_folder(mirror, view.folder_sets.as_ref(), *kind, level)
            }
            None => Vec::new(),
        };
        self.folder_tx.send_replace(folder);
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new()
    }
}
