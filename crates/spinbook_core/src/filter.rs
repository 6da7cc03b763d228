//! Pure search/level projection of the catalog mirror.

use crate::models::element::Element;
use crate::models::level::LevelFilter;

/// Search text plus level facet, owned by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub level: LevelFilter,
}

impl FilterState {
    pub fn new(search: impl Into<String>, level: LevelFilter) -> Self {
        Self {
            search: search.into(),
            level,
        }
    }
}

/// Project the mirror through a filter state.
///
/// Case-insensitive substring match on the name AND an exact
/// (case-insensitive) level match unless the facet is the wildcard. Mirror
/// order (name ascending) is preserved.
///
/// # Returns
/// The matching elements, cloned out of the mirror.
pub fn filter_elements(elements: &[Element], filter: &FilterState) -> Vec<Element> {
    let needle = filter.search.to_lowercase();
    elements
        .iter()
        .filter(|element| {
            let name_matches = needle.is_empty() || element.name.to_lowercase().contains(&needle);
            name_matches && filter.level.matches(&element.level)
        })
        .cloned()
        .collect()
}
