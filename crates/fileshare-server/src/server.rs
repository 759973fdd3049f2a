//! Server startup and lifecycle.

use crate::{routes, state::AppState, ServerConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone()).await?);
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("fileshare-server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Run server with graceful shutdown, for tests that need to tear the
/// listener down deterministically.
pub async fn run_server_with_shutdown(
    config: ServerConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone()).await?);
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("fileshare-server listening on http://{}", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await?;

    info!("fileshare-server shutdown complete");
    Ok(())
}
