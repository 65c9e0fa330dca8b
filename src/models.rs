use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::findings::FindingSet;
use crate::scoring::Grade;
use crate::security::ScanTarget;

/// Completed scan report.
///
/// This is the externally visible shape of a scan: returned by the status
/// endpoint, served from cache and stored in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub target: ScanTarget,
    pub findings: FindingSet,
    pub score: u8,
    pub grade: Grade,
    pub narrative: String,
    pub created_at: DateTime<Utc>,
    /// Last URL requested after following redirects.
    pub final_url: String,
    pub status_code: u16,
    #[serde(default)]
    pub redirect_chain: Vec<String>,
    #[serde(default)]
    pub body_truncated: bool,
    pub scan_duration_ms: u64,
}
