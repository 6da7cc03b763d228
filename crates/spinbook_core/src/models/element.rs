//! Catalog element records and id derivation.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A catalog entry: one trainable element.
///
/// `id` is derived from the name at creation time and never changes for the
/// life of the record. `image`/`video` hold media URLs or empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub name: String,
    /// Display label, e.g. "Beginner".
    pub level: String,
    /// Ordinal level code as stored upstream of any display mapping.
    pub level_number: String,
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub video: String,
}

/// Partial field update applied to an existing element.
///
/// The element id is immutable; everything else is replaced as a unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementPatch {
    pub name: String,
    pub level: String,
    pub level_number: String,
    pub description: String,
    pub image: String,
    pub video: String,
}

impl Element {
    /// Apply a patch, keeping the id untouched.
    pub fn apply_patch(&mut self, patch: &ElementPatch) {
        self.name = patch.name.clone();
        self.level = patch.level.clone();
        self.level_number = patch.level_number.clone();
        self.description = patch.description.clone();
        self.image = patch.image.clone();
        self.video = patch.video.clone();
    }
}

/// Derive a stable element id from a display name.
///
/// Lowercases, collapses whitespace runs to `_`, strips everything outside
/// `[a-z0-9_-]`, and trims leading/trailing separators. A name that strips to
/// nothing falls back to a timestamp-based id so creation never fails here.
///
/// # Returns
/// A non-empty id string.
pub fn derive_element_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().to_lowercase().chars() {
        if ch.is_whitespace() {
            pending_separator = !id.is_empty();
            continue;
        }
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '-' {
            if pending_separator {
                id.push('_');
                pending_separator = false;
            }
            id.push(ch);
        }
    }
    let id = id.trim_matches(|ch| ch == '_' || ch == '-');
    if id.is_empty() {
        return format!("element_{}", Utc::now().timestamp_millis());
    }
    id.to_string()
}
