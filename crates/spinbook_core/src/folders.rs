//! Folder membership resolution.

use crate::models::element::Element;
use crate::models::level::LevelFilter;
use crate::models::user::{FolderKind, FolderSets};

/// Resolve the catalog elements belonging to one user folder.
///
/// Read-only over both inputs; mirror order (name ascending) is preserved.
/// `sets` is `None` while the user's folder data has not loaded yet, which
/// resolves to an empty sequence — the caller distinguishes "loading" from
/// "empty" via its own loading flag.
///
/// # Returns
/// Elements whose id is in the selected folder, narrowed by `level` when the
/// facet is not the wildcard.
pub fn elements_in_folder(
    elements: &[Element],
    sets: Option<&FolderSets>,
    kind: FolderKind,
    level: &LevelFilter,
) -> Vec<Element> {
    let Some(sets) = sets else {
        return Vec::new();
    };
    let ids = sets.set(kind);
    elements
        .iter()
        .filter(|element| ids.contains(&element.id) && level.matches(&element.level))
        .cloned()
        .collect()
}
