//! HTTP error mapping for API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use spinbook_core::CatalogError;

/// Wrapper turning [`CatalogError`] into an HTTP response.
pub struct HttpError(pub CatalogError);

impl From<CatalogError> for HttpError {
    fn from(value: CatalogError) -> Self {
        Self(value)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CatalogError::NotFound => StatusCode::NOT_FOUND,
            CatalogError::Duplicate(_) => StatusCode::CONFLICT,
            CatalogError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CatalogError::Database(_)
            | CatalogError::StorageMessage(_)
            | CatalogError::Serialization(_)
            | CatalogError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}
