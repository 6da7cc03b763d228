//! Profile and folder HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use spinbook_core::folders::elements_in_folder;
use spinbook_core::models::element::Element;
use spinbook_core::models::level::LevelFilter;
use spinbook_core::models::user::{FolderKind, FolderStatus, UserProfile};
use spinbook_core::store::{CatalogStore, ProfileStore};
use spinbook_core::CatalogError;

/// Request payload for creating/confirming a profile.
#[derive(Debug, Deserialize)]
pub struct EnsureProfileRequest {
    pub username: String,
}

/// Query parameters for folder listings.
#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    pub level: Option<String>,
}

fn parse_folder(folder: &str) -> Result<FolderKind, HttpError> {
    FolderKind::parse(folder).ok_or_else(|| {
        HttpError(CatalogError::BadRequest(format!(
            "unknown folder '{}'",
            folder
        )))
    })
}

/// Fetch a user profile, including its folder id-sets and admin flag.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<UserProfile>, HttpError> {
    let profile = state
        .profiles
        .fetch(&uid)
        .await?
        .ok_or(CatalogError::NotFound)?;
    Ok(Json(profile))
}

/// Create a profile when missing, otherwise return the existing one.
pub async fn ensure_profile(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    Json(req): Json<EnsureProfileRequest>,
) -> Result<Json<UserProfile>, HttpError> {
    if req.username.trim().is_empty() {
        return Err(CatalogError::BadRequest("username must not be blank".to_string()).into());
    }
    let profile = state.profiles.ensure(&uid, req.username.trim()).await?;
    Ok(Json(profile))
}

/// Resolve one folder to its catalog elements, narrowed by level.
pub async fn folder_elements(
    State(state): State<AppState>,
    Path((uid, folder)): Path<(String, String)>,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Vec<Element>>, HttpError> {
    let kind = parse_folder(&folder)?;
    let profile = state
        .profiles
        .fetch(&uid)
        .await?
        .ok_or(CatalogError::NotFound)?;
    let level = LevelFilter::parse(query.level.as_deref().unwrap_or(""));
    let elements = state.store.fetch_all().await?;
    Ok(Json(elements_in_folder(
        &elements,
        Some(&profile.folders),
        kind,
        &level,
    )))
}

async fn folder_status_after(
    state: &AppState,
    uid: &str,
    element_id: &str,
) -> Result<FolderStatus, CatalogError> {
    let profile = state
        .profiles
        .fetch(uid)
        .await?
        .ok_or(CatalogError::NotFound)?;
    Ok(profile.folders.status(element_id))
}

/// Add one element to one folder (atomic single-id set union).
pub async fn add_to_folder(
    State(state): State<AppState>,
    Path((uid, folder, element_id)): Path<(String, String, String)>,
) -> Result<Json<FolderStatus>, HttpError> {
    let kind = parse_folder(&folder)?;
    state.profiles.folder_add(&uid, kind, &element_id).await?;
    Ok(Json(folder_status_after(&state, &uid, &element_id).await?))
}

/// Remove one element from one folder (atomic single-id set difference).
pub async fn remove_from_folder(
    State(state): State<AppState>,
    Path((uid, folder, element_id)): Path<(String, String, String)>,
) -> Result<Json<FolderStatus>, HttpError> {
    let kind = parse_folder(&folder)?;
    state
        .profiles
        .folder_remove(&uid, kind, &element_id)
        .await?;
    Ok(Json(folder_status_after(&state, &uid, &element_id).await?))
}
