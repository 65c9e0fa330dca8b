//! History listing handler.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;

use super::super::types::{ApiError, ApiState};
use super::scan::user_id;
use crate::models::ScanResult;
use crate::storage::HistoryFilter;

/// `GET /history?host=&since=&limit=`
pub async fn history_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<Vec<ScanResult>>, ApiError> {
    let user = user_id(&headers).ok_or(ApiError::MissingUser)?;
    let history = state.history.as_ref().ok_or(ApiError::HistoryUnavailable)?;
    let results = history.list(&user, &filter).await?;
    Ok(Json(results))
}
