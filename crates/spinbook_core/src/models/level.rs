//! Skill level enumeration and level filters.

use serde::{Deserialize, Serialize};

/// Fixed set of skill levels used by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Spins,
    Beginner,
    Intermediate,
    Advanced,
    Other,
}

impl Level {
    /// All levels in display order.
    pub const ALL: [Level; 5] = [
        Level::Spins,
        Level::Beginner,
        Level::Intermediate,
        Level::Advanced,
        Level::Other,
    ];

    /// The label shown to users and stored on element records.
    pub fn display_name(&self) -> &'static str {
        match self {
            Level::Spins => "Spins",
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
            Level::Other => "Other",
        }
    }

    /// Resolve a display label; unknown labels map to [`Level::Other`].
    pub fn from_display_name(label: &str) -> Level {
        Level::ALL
            .into_iter()
            .find(|level| level.display_name() == label)
            .unwrap_or(Level::Other)
    }
}

/// Single-valued level facet: a wildcard or one level label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelFilter {
    All,
    Label(String),
}

/// Wildcard label accepted from user input.
pub const LEVEL_FILTER_ALL: &str = "All";

impl LevelFilter {
    /// Parse a facet value; the wildcard label (case-insensitive) or an empty
    /// string selects [`LevelFilter::All`].
    pub fn parse(value: &str) -> LevelFilter {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(LEVEL_FILTER_ALL) {
            LevelFilter::All
        } else {
            LevelFilter::Label(trimmed.to_string())
        }
    }

    /// Whether an element's level label passes this facet.
    pub fn matches(&self, level: &str) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Label(label) => level.eq_ignore_ascii_case(label),
        }
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        LevelFilter::All
    }
}
