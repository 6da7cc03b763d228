//! Headless API server entrypoint.

use spinbook_core::config::env_flag_enabled;
use spinbook_server::{create_app, resolve_bind_address, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spinbook=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let allow_public_access = env_flag_enabled("SPINBOOK_ALLOW_PUBLIC_ACCESS");
    let state = AppState::open(config)?;

    // Realtime loop: keeps the in-process mirror fresh and announces new
    // elements through the log notifier while the server runs.
    state.catalog.subscribe().await?;
    state.catalog.refresh_all().await?;

    let addr = resolve_bind_address(&state.config, allow_public_access);
    let app = create_app(state, allow_public_access);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Spinbook API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
