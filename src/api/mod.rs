//! Read-only status API over published sensor states.

pub mod handlers;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::sensor::EntityRegistry;
use self::handlers::*;

pub fn setup_api_router(registry: Arc<EntityRegistry>) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/{unique_id}", get(get_sensor))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Serve the status API until shutdown.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<EntityRegistry>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Status API starting");

    axum::serve(listener, setup_api_router(registry))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Status API stopped");
    Ok(())
}
