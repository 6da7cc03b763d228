//! Data models for catalog records and user profiles.

/// Catalog element records and id derivation.
pub mod element;
/// Skill level enumeration and level filters.
pub mod level;
/// User profiles and folder id-sets.
pub mod user;

pub use element::Element;
pub use level::{Level, LevelFilter};
pub use user::{FolderKind, FolderSets, FolderStatus, UserProfile};
