//! HTTP API in front of the orchestrator.
//!
//! Provides:
//! - `POST /scan` - submit a URL
//! - `GET /scan/status/{job_id}` - job state, optionally waiting for completion
//! - `GET /history` - the caller's stored scans
//! - `GET /health` - liveness and queue depth
//! - `GET /metrics` - Prometheus-compatible counters

mod handlers;
mod types;

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use handlers::{health_handler, history_handler, metrics_handler, status_handler, submit_handler};
pub use types::{ApiError, ApiState};

/// Builds the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/scan", post(submit_handler))
        .route("/scan/status/{job_id}", get(status_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` is cancelled.
pub async fn start_api_server(
    listener: TcpListener,
    state: ApiState,
    shutdown: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr = listener
        .local_addr()
        .map_err(|e| anyhow::anyhow!("Failed to read API listen address: {}", e))?;
    log::info!("API server listening on http://{}/", addr);
    log::info!("  - Submit: POST http://{}/scan", addr);
    log::info!("  - Metrics: http://{}/metrics", addr);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| anyhow::anyhow!("API server error: {}", e))?;

    log::info!("API server stopped");
    Ok(())
}
