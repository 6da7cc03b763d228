//! Filesystem-backed media store.
//!
//! Objects live under a configured root, split by kind prefix, and are
//! addressed by `media://` URLs so records stay portable across hosts.

use crate::error::CatalogError;
use crate::store::MediaStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// URL scheme for objects managed by [`FsMediaStore`].
pub const MEDIA_URL_SCHEME: &str = "media://";

/// Kind of media attached to an element; determines the storage prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Storage prefix for this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Image => "element_images",
            MediaKind::Video => "element_videos",
        }
    }

    /// Resolve a kind from its URL segment.
    pub fn parse(value: &str) -> Option<MediaKind> {
        match value {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// Replace path-hostile characters so any client-supplied file name is safe
/// to embed in an object name.
fn sanitize_file_name(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

/// Media store rooted at a local directory.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns an error when the root directory cannot be created.
    pub fn new(root: &Path) -> Result<Self, CatalogError> {
        std::fs::create_dir_all(root).map_err(|err| {
            CatalogError::Media(format!(
                "Failed to create media root {}: {}",
                root.display(),
                err
            ))
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Map a `media://` URL back to a path under the store root.
    ///
    /// # Errors
    /// Rejects foreign schemes and path traversal.
    fn resolve(&self, url: &str) -> Result<PathBuf, CatalogError> {
        let Some(rest) = url.strip_prefix(MEDIA_URL_SCHEME) else {
            return Err(CatalogError::Media(format!(
                "Not a managed media URL: {}",
                url
            )));
        };
        if rest.split('/').any(|segment| segment == "..") {
            return Err(CatalogError::Media(format!(
                "Refusing traversal in media URL: {}",
                url
            )));
        }
        Ok(self.root.join(rest))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn upload(
        &self,
        kind: MediaKind,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, CatalogError> {
        let object_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        let dir = self.root.join(kind.prefix());
        std::fs::create_dir_all(&dir).map_err(|err| {
            CatalogError::Media(format!(
                "Failed to create media directory {}: {}",
                dir.display(),
                err
            ))
        })?;
        let path = dir.join(&object_name);
        std::fs::write(&path, bytes).map_err(|err| {
            CatalogError::Media(format!("Failed to store {}: {}", path.display(), err))
        })?;
        Ok(format!(
            "{}{}/{}",
            MEDIA_URL_SCHEME,
            kind.prefix(),
            object_name
        ))
    }

    async fn delete(&self, url: &str) -> Result<bool, CatalogError> {
        if url.is_empty() {
            return Ok(true); // nothing to delete
        }
        let path = self.resolve(url)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(CatalogError::Media(format!(
                "Failed to delete {}: {}",
                path.display(),
                err
            ))),
        }
    }
}
