//! Health check handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::super::types::{ApiState, HealthChecks, HealthResponse};

/// `GET /health`
///
/// Degraded (503) when the history database does not answer.
pub async fn health_handler(State(state): State<ApiState>) -> Response {
    let database = match &state.history {
        None => "disabled",
        Some(history) => match history.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                log::warn!("Health check: history database unavailable: {e}");
                "error"
            }
        },
    };
    let (queued, running, _) = state.orchestrator.load();
    let healthy = database != "error";

    let response = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        uptime_seconds: state.start_time.elapsed().as_secs(),
        checks: HealthChecks {
            database,
            queued_jobs: queued,
            running_jobs: running,
            queue_capacity: state.orchestrator.settings().queue_capacity,
        },
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response)).into_response()
}
