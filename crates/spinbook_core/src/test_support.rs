//! Shared test-only helpers for spinbook_core.

use crate::models::element::Element;
use crate::store::LocalStore;
use tempfile::TempDir;

/// Creates an isolated temporary store and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing
/// files.
pub(crate) fn setup_temp_store() -> (LocalStore, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let store = LocalStore::open(temp_dir.path()).expect("local store");
    (store, temp_dir)
}

/// Minimal element record for fixtures.
pub(crate) fn sample_element(id: &str, name: &str, level: &str) -> Element {
    Element {
        id: id.to_string(),
        name: name.to_string(),
        level: level.to_string(),
        level_number: "0".to_string(),
        description: String::new(),
        image: String::new(),
        video: String::new(),
    }
}
