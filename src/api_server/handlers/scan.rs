//! Scan submission and status handlers.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::super::types::{ApiError, ApiState, CachedResponse, ScanRequest, StatusQuery};
use crate::config::{STATUS_MAX_WAIT, USER_ID_HEADER};
use crate::jobs::{Caller, JobStatus, SubmitOutcome};

/// User id set by the upstream auth layer, if any.
pub(crate) fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Signed-in users are limited per user, everyone else per peer address.
fn caller(headers: &HeaderMap, peer: SocketAddr) -> Caller {
    match user_id(headers) {
        Some(user) => Caller::user(user),
        None => Caller::anonymous(peer.ip().to_string()),
    }
}

/// `POST /scan`
pub async fn submit_handler(
    State(state): State<ApiState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ScanRequest>,
) -> Result<Response, ApiError> {
    let caller = caller(&headers, peer);
    let response = match state.orchestrator.submit(&request.url, &caller).await? {
        SubmitOutcome::Cached(result) => (
            StatusCode::OK,
            Json(CachedResponse {
                status: JobStatus::Complete,
                result,
            }),
        )
            .into_response(),
        SubmitOutcome::Queued(snapshot) | SubmitOutcome::Attached(snapshot) => {
            (StatusCode::ACCEPTED, Json(snapshot)).into_response()
        }
    };
    Ok(response)
}

/// `GET /scan/status/{job_id}`
pub async fn status_handler(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Response, ApiError> {
    let snapshot = match query.wait.filter(|secs| *secs > 0) {
        Some(secs) => {
            let wait = Duration::from_secs(secs).min(STATUS_MAX_WAIT);
            state.orchestrator.wait(&job_id, wait).await?
        }
        None => state.orchestrator.status(&job_id)?,
    };
    Ok((StatusCode::OK, Json(snapshot)).into_response())
}
