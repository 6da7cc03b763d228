//! User profiles and folder id-sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The three fixed per-user folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderKind {
    Mastered,
    Favorites,
    Wishlist,
}

impl FolderKind {
    pub const ALL: [FolderKind; 3] = [
        FolderKind::Mastered,
        FolderKind::Favorites,
        FolderKind::Wishlist,
    ];

    /// Stable key used in profile records and URLs.
    pub fn key(&self) -> &'static str {
        match self {
            FolderKind::Mastered => "mastered",
            FolderKind::Favorites => "favorites",
            FolderKind::Wishlist => "wishlist",
        }
    }

    /// Resolve a folder key; unknown keys are rejected rather than defaulted.
    pub fn parse(key: &str) -> Option<FolderKind> {
        FolderKind::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

/// Per-user element id-sets, one per folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSets {
    #[serde(default)]
    pub mastered: BTreeSet<String>,
    #[serde(default)]
    pub favorites: BTreeSet<String>,
    #[serde(default)]
    pub wishlist: BTreeSet<String>,
}

/// Which folders contain a given element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderStatus {
    pub mastered: bool,
    pub favorites: bool,
    pub wishlist: bool,
}

impl FolderSets {
    /// The id-set backing one folder.
    pub fn set(&self, kind: FolderKind) -> &BTreeSet<String> {
        match kind {
            FolderKind::Mastered => &self.mastered,
            FolderKind::Favorites => &self.favorites,
            FolderKind::Wishlist => &self.wishlist,
        }
    }

    pub(crate) fn set_mut(&mut self, kind: FolderKind) -> &mut BTreeSet<String> {
        match kind {
            FolderKind::Mastered => &mut self.mastered,
            FolderKind::Favorites => &mut self.favorites,
            FolderKind::Wishlist => &mut self.wishlist,
        }
    }

    pub fn contains(&self, kind: FolderKind, element_id: &str) -> bool {
        self.set(kind).contains(element_id)
    }

    /// Membership of one element across all three folders.
    pub fn status(&self, element_id: &str) -> FolderStatus {
        FolderStatus {
            mastered: self.mastered.contains(element_id),
            favorites: self.favorites.contains(element_id),
            wishlist: self.wishlist.contains(element_id),
        }
    }
}

/// Per-user record stored alongside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub folders: FolderSets,
}

impl UserProfile {
    /// Fresh profile with empty folders and no admin rights.
    pub fn new(uid: String, username: String) -> Self {
        Self {
            uid,
            username,
            is_admin: false,
            created_at: Utc::now(),
            folders: FolderSets::default(),
        }
    }
}
