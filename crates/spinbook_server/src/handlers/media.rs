//! Media upload HTTP handler.

use crate::{error::HttpError, AppState};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::header,
    Json,
};
use hyper::HeaderMap;
use serde::Deserialize;
use spinbook_core::store::MediaKind;
use spinbook_core::CatalogError;
use tracing::debug;

/// Query parameters for media uploads.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original file name, kept (sanitized) in the stored object name.
    pub name: Option<String>,
}

/// Store a media object and return its retrieval URL.
///
/// The element create/update endpoints take this URL in their `image`/
/// `video` fields.
pub async fn upload_media(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, HttpError> {
    let Some(kind) = MediaKind::parse(&kind) else {
        return Err(CatalogError::BadRequest(format!("unknown media kind '{}'", kind)).into());
    };
    if body.is_empty() {
        return Err(CatalogError::BadRequest("upload body must not be empty".to_string()).into());
    }

    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        debug!(
            target: "spinbook_server::media",
            "upload content-type: {:?}", content_type
        );
    }

    let file_name = query.name.unwrap_or_else(|| "file".to_string());
    let url = state.media.upload(kind, &file_name, &body).await?;
    Ok(Json(serde_json::json!({ "url": url })))
}
