//! Asynchronous scan jobs.
//!
//! This module owns the shared state behind the API:
//! - The job table, with single-flight admission per host
//! - The result cache
//! - Per-client rate limiting
//! - The worker pool that runs [`crate::engine::ScanEngine`]

mod cache;
mod orchestrator;
mod rate_limit;
mod table;
mod types;

pub use orchestrator::Orchestrator;
pub use types::{Caller, JobError, JobSnapshot, JobStatus, SubmitOutcome};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::findings::FindingSet;
    use crate::models::ScanResult;
    use crate::scoring::Grade;
    use crate::security::{ScanTarget, Scheme};

    pub(crate) fn target(host: &str) -> ScanTarget {
        ScanTarget {
            scheme: Scheme::Https,
            host: host.to_string(),
            port: 443,
            original: format!("https://{host}"),
        }
    }

    pub(crate) fn sample_result(host: &str) -> ScanResult {
        ScanResult {
            target: target(host),
            findings: FindingSet::from_findings([]),
            score: 8,
            grade: Grade::Critical,
            narrative: "Security grade: Critical (8/100).".to_string(),
            created_at: Utc::now(),
            final_url: format!("https://{host}/"),
            status_code: 200,
            redirect_chain: vec![format!("https://{host}/")],
            body_truncated: false,
            scan_duration_ms: 5,
        }
    }
}
