//! Element HTTP handlers.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use spinbook_core::catalog::{ElementUpdate, MediaSource, NewElement};
use spinbook_core::filter::{filter_elements, FilterState};
use spinbook_core::models::element::Element;
use spinbook_core::models::level::LevelFilter;
use spinbook_core::store::CatalogStore;
use spinbook_core::CatalogError;

/// Query parameters for the catalog browser.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub level: Option<String>,
}

/// Request payload for creating an element.
///
/// `image`/`video` are URLs of already-uploaded media (see
/// `POST /api/media/:kind`).
#[derive(Debug, Deserialize)]
pub struct CreateElementRequest {
    pub name: String,
    pub description: Option<String>,
    pub level: String,
    pub level_number: String,
    pub image: Option<String>,
    pub video: Option<String>,
}

/// Request payload for updating an element. Absent fields keep their
/// current value.
#[derive(Debug, Deserialize)]
pub struct UpdateElementRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<String>,
    pub level_number: Option<String>,
    pub image: Option<String>,
    pub video: Option<String>,
}

/// List catalog elements filtered by search text and level facet.
pub async fn list_elements(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Element>>, HttpError> {
    let filter = FilterState::new(
        query.search.unwrap_or_default(),
        LevelFilter::parse(query.level.as_deref().unwrap_or("")),
    );
    let elements = state.store.fetch_all().await?;
    Ok(Json(filter_elements(&elements, &filter)))
}

/// Fetch one element by id.
pub async fn get_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Element>, HttpError> {
    let element = state.store.fetch(&id).await?.ok_or(CatalogError::NotFound)?;
    Ok(Json(element))
}

/// Create a new element.
///
/// # Errors
/// 400 for a blank name, 409 when the derived id is already taken.
pub async fn create_element(
    State(state): State<AppState>,
    Json(req): Json<CreateElementRequest>,
) -> Result<Json<Element>, HttpError> {
    if req.name.trim().is_empty() {
        return Err(CatalogError::BadRequest("element name must not be blank".to_string()).into());
    }

    let id = state
        .catalog
        .create_element(NewElement {
            name: req.name,
            description: req.description.unwrap_or_default(),
            level: req.level,
            level_number: req.level_number,
            image: req.image.map(MediaSource::Remote),
            video: req.video.map(MediaSource::Remote),
        })
        .await?;
    let element = state.store.fetch(&id).await?.ok_or(CatalogError::NotFound)?;
    Ok(Json(element))
}

/// Patch an element's fields; media URLs given here replace (and clean up)
/// the previous objects.
pub async fn update_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateElementRequest>,
) -> Result<Json<Element>, HttpError> {
    let current = state.store.fetch(&id).await?.ok_or(CatalogError::NotFound)?;

    state
        .catalog
        .update_element(ElementUpdate {
            id: id.clone(),
            name: req.name.unwrap_or_else(|| current.name.clone()),
            description: req
                .description
                .unwrap_or_else(|| current.description.clone()),
            level: req.level.unwrap_or_else(|| current.level.clone()),
            level_number: req
                .level_number
                .unwrap_or_else(|| current.level_number.clone()),
            new_image: req.image.map(MediaSource::Remote),
            current_image: current.image.clone(),
            new_video: req.video.map(MediaSource::Remote),
            current_video: current.video.clone(),
        })
        .await?;

    let element = state.store.fetch(&id).await?.ok_or(CatalogError::NotFound)?;
    Ok(Json(element))
}

/// Delete an element, its media (best-effort), and its record.
pub async fn delete_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, HttpError> {
    state.catalog.delete_element(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": true, "id": id })))
}
