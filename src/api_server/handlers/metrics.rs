//! Prometheus metrics handler.

use std::fmt::Write;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use super::super::types::ApiState;

/// Prometheus-compatible metrics endpoint
pub async fn metrics_handler(State(state): State<ApiState>) -> Response {
    let (queued, running, cached) = state.orchestrator.load();
    let mut metrics = String::new();

    let _ = writeln!(
        metrics,
        "# HELP site_posture_events_total Scan pipeline events by kind\n\
         # TYPE site_posture_events_total counter"
    );
    for (event, count) in state.orchestrator.stats().snapshot() {
        let _ = writeln!(metrics, "site_posture_events_total{{event=\"{event}\"}} {count}");
    }

    let gauges = [
        ("site_posture_jobs_queued", "Jobs waiting for a worker", queued),
        ("site_posture_jobs_running", "Jobs currently scanning", running),
        ("site_posture_cached_results", "Results held in the cache", cached),
    ];
    for (name, help, value) in gauges {
        let _ = writeln!(metrics, "\n# HELP {name} {help}\n# TYPE {name} gauge\n{name} {value}");
    }

    let _ = writeln!(
        metrics,
        "\n# HELP site_posture_uptime_seconds Seconds since the server started\n\
         # TYPE site_posture_uptime_seconds gauge\n\
         site_posture_uptime_seconds {}",
        state.start_time.elapsed().as_secs()
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
        .into_response()
}
