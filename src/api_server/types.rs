//! API server data structures.

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error_handling::{DatabaseError, ScanError};
use crate::jobs::{JobStatus, Orchestrator};
use crate::models::ScanResult;
use crate::storage::HistoryStore;

/// Shared state for the API server
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub history: Option<Arc<dyn HistoryStore>>,
    pub start_time: Arc<Instant>,
}

impl ApiState {
    pub fn new(orchestrator: Arc<Orchestrator>, history: Option<Arc<dyn HistoryStore>>) -> Self {
        Self {
            orchestrator,
            history,
            start_time: Arc::new(Instant::now()),
        }
    }
}

/// Body of `POST /scan`
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub url: String,
}

/// `POST /scan` answered from cache
#[derive(Serialize)]
pub struct CachedResponse {
    pub status: JobStatus,
    pub result: Arc<ScanResult>,
}

/// Query of `GET /scan/status/{job_id}`
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    /// Seconds to wait for the job to finish before answering
    pub wait: Option<u64>,
}

/// JSON response for `/health`
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub database: &'static str,
    pub queued_jobs: usize,
    pub running_jobs: usize,
    pub queue_capacity: usize,
}

/// JSON error body
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    Scan(ScanError),
    /// `/history` needs a user id header
    MissingUser,
    /// No history store is configured
    HistoryUnavailable,
    Database(DatabaseError),
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        ApiError::Scan(e)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(e: DatabaseError) -> Self {
        ApiError::Database(e)
    }
}

fn scan_error_status(e: &ScanError) -> StatusCode {
    match e {
        ScanError::InvalidInput(_) | ScanError::UnsafeTarget(_) | ScanError::Resolution(_) => {
            StatusCode::BAD_REQUEST
        }
        ScanError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        ScanError::NotFound(_) => StatusCode::NOT_FOUND,
        ScanError::Busy => StatusCode::SERVICE_UNAVAILABLE,
        ScanError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ScanError::Fetch(_) => StatusCode::BAD_GATEWAY,
        ScanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Scan(e) => (scan_error_status(e), e.code(), e.public_message()),
            ApiError::MissingUser => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "a signed-in user is required".to_string(),
            ),
            ApiError::HistoryUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "HistoryUnavailable",
                "scan history is not available".to_string(),
            ),
            ApiError::Database(e) => {
                log::error!("History query failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "internal error".to_string(),
                )
            }
        };
        (
            status,
            Json(ErrorBody {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}
