//! Configuration loading from environment variables.

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for Spinbook.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory holding the catalog database.
    pub data_dir: String,
    /// Root directory for uploaded media objects.
    pub media_dir: String,
    pub port: u16,
    /// Minimum seconds between visible new-element alerts.
    pub notify_cooldown_secs: u64,
    /// Maximum accepted media upload size in bytes.
    pub max_upload_size: usize,
}

/// Expand a leading tilde to the user's home directory.
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }
    std::env::current_dir().ok()
}

fn default_data_dir() -> PathBuf {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".local").join("share").join("spinbook")
}

/// Parse a boolean-like environment flag value.
///
/// Truthy: `1`, `true`, `yes`, `on`. Falsy: `0`, `false`, `no`, `off`, empty.
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        let data_dir = env::var("SPINBOOK_DATA_DIR")
            .map(expand_tilde)
            .unwrap_or_else(|_| default_data_dir().to_string_lossy().to_string());
        let media_dir = env::var("SPINBOOK_MEDIA_DIR")
            .map(expand_tilde)
            .unwrap_or_else(|_| {
                PathBuf::from(&data_dir)
                    .join("media")
                    .to_string_lossy()
                    .to_string()
            });
        Self {
            data_dir,
            media_dir,
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(38732),
            notify_cooldown_secs: env::var("SPINBOOK_NOTIFY_COOLDOWN_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            max_upload_size: env::var("SPINBOOK_MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50 * 1024 * 1024), // uploads are photos/videos
        }
    }
}
