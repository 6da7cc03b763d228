//! HTTP server wiring for Spinbook (API, handlers, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for element, folder, and media endpoints.
pub mod handlers;

pub use error::HttpError;
pub use spinbook_core::{
    catalog, config, filter, folders, models, store, Catalog, CatalogError, Config,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use spinbook_core::store::{FsMediaStore, LocalStore, LogNotifier};
use spinbook_core::store::{CatalogStore, MediaStore, ProfileStore};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn CatalogStore>,
    pub media: Arc<dyn MediaStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Open the local stores described by `config` and wire a catalog over
    /// them.
    ///
    /// # Errors
    /// Returns an error when the data directory or media root cannot be
    /// initialized.
    pub fn open(config: Config) -> Result<Self, CatalogError> {
        let store = Arc::new(LocalStore::open(Path::new(&config.data_dir))?);
        let media = Arc::new(FsMediaStore::new(Path::new(&config.media_dir))?);
        Ok(Self::with_stores(config, store.clone(), media, store))
    }

    /// Wire state over pre-built stores (used by tests and embeddings).
    pub fn with_stores(
        config: Config,
        store: Arc<dyn CatalogStore>,
        media: Arc<dyn MediaStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let catalog = Arc::new(Catalog::new(
            store.clone(),
            media.clone(),
            profiles.clone(),
            Arc::new(LogNotifier),
            Duration::from_secs(config.notify_cooldown_secs),
        ));
        Self {
            catalog,
            store,
            media,
            profiles,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any
///   origin.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors = if allow_public_access {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };
    let max_upload = state.config.max_upload_size;

    Router::new()
        .route(
            "/api/elements",
            get(handlers::element::list_elements).post(handlers::element::create_element),
        )
        .route(
            "/api/elements/:id",
            get(handlers::element::get_element)
                .put(handlers::element::update_element)
                .delete(handlers::element::delete_element),
        )
        .route("/api/media/:kind", post(handlers::media::upload_media))
        .route(
            "/api/users/:uid",
            get(handlers::folder::get_profile).put(handlers::folder::ensure_profile),
        )
        .route(
            "/api/users/:uid/folders/:folder",
            get(handlers::folder::folder_elements),
        )
        .route(
            "/api/users/:uid/folders/:folder/:element_id",
            axum::routing::put(handlers::folder::add_to_folder)
                .delete(handlers::folder::remove_from_folder),
        )
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::HeaderName::from_static("x-spinbook-version"),
            HeaderValue::from_static(env!("CARGO_PKG_VERSION")),
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Resolve the listener address, forcing loopback unless public access is
/// explicitly allowed.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without SPINBOOK_ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    default_bind
}
