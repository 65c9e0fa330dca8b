//! Job types.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::error_handling::ScanError;
use crate::models::ScanResult;
use crate::security::ScanTarget;

/// Lifecycle of a job. `Complete` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

/// Failure recorded on a job: a stable code plus a caller-safe message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobError {
    pub code: &'static str,
    pub message: String,
}

impl From<&ScanError> for JobError {
    fn from(e: &ScanError) -> Self {
        JobError {
            code: e.code(),
            message: e.public_message(),
        }
    }
}

/// One scan request in the job table.
#[derive(Debug, Clone)]
pub(crate) struct ScanJob {
    pub(crate) target: ScanTarget,
    pub(crate) status: JobStatus,
    pub(crate) progress: u8,
    pub(crate) result: Option<Arc<ScanResult>>,
    pub(crate) error: Option<JobError>,
    /// Users whose history receives the result.
    pub(crate) subscribers: Vec<String>,
    pub(crate) finished_at: Option<Instant>,
}

impl ScanJob {
    pub(crate) fn new(target: ScanTarget, user_id: Option<String>) -> Self {
        Self {
            target,
            status: JobStatus::Queued,
            progress: 0,
            result: None,
            error: None,
            subscribers: user_id.into_iter().collect(),
            finished_at: None,
        }
    }
}

/// Point-in-time view of a job, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Arc<ScanResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobError>,
}

/// Outcome of a submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// A fresh cached result; no job was created.
    Cached(Arc<ScanResult>),
    /// A new job was queued.
    Queued(JobSnapshot),
    /// An in-flight job for the same host was reused.
    Attached(JobSnapshot),
}

/// Who is submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Rate-limit bucket.
    pub client_key: String,
    /// Authenticated user, if any; results are recorded in their history.
    pub user_id: Option<String>,
}

impl Caller {
    pub fn anonymous(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            user_id: None,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            client_key: format!("user:{user_id}"),
            user_id: Some(user_id),
        }
    }
}
