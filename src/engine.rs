//! Single-scan pipeline.
//!
//! Resolution and address check, then the HTTP fetch alongside the mail DNS
//! lookups, then extraction, scoring and the narrative.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::dns::HostLookup;
use crate::error_handling::ScanError;
use crate::fetch::SafeFetcher;
use crate::findings::{extract_findings, DnsRecords};
use crate::models::ScanResult;
use crate::scoring::{narrative, score_and_grade};
use crate::security::{resolve_target, AddressGuard, ScanTarget};

/// Progress milestones reported while a scan runs.
pub mod progress {
    /// Job picked up by a worker.
    pub const STARTED: u8 = 10;
    /// Target resolved and passed the address guard.
    pub const RESOLVED: u8 = 25;
    /// Fetch and DNS lookups finished.
    pub const FETCHED: u8 = 40;
    /// Findings extracted and scored.
    pub const SCORED: u8 = 90;
    /// Result published.
    pub const DONE: u8 = 100;
}

/// Runs scans. Cheap to clone; all parts are shared.
#[derive(Clone)]
pub struct ScanEngine {
    lookup: Arc<dyn HostLookup>,
    guard: AddressGuard,
    fetcher: SafeFetcher,
}

impl ScanEngine {
    pub fn new(lookup: Arc<dyn HostLookup>, guard: AddressGuard, fetcher: SafeFetcher) -> Self {
        Self {
            lookup,
            guard,
            fetcher,
        }
    }

    pub fn guard(&self) -> &AddressGuard {
        &self.guard
    }

    /// Scans `target`, reporting milestones through `on_progress`.
    pub async fn run(
        &self,
        target: &ScanTarget,
        on_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> Result<ScanResult, ScanError> {
        let started = Instant::now();

        let validated = resolve_target(target, self.lookup.as_ref(), &self.guard).await?;
        on_progress(progress::RESOLVED);

        let mail_records = async {
            // Literal addresses have no mail domain
            if target.literal_ip().is_some() {
                DnsRecords::default()
            } else {
                DnsRecords::gather(&target.host, self.lookup.as_ref()).await
            }
        };
        let (outcome, records) = tokio::join!(self.fetcher.fetch(&validated), mail_records);
        let outcome = outcome?;
        on_progress(progress::FETCHED);

        let findings = extract_findings(&outcome, &records);
        let (score, grade) = score_and_grade(&findings);
        let narrative = narrative(&findings, score, grade);
        on_progress(progress::SCORED);

        log::info!(
            "Scanned {target}: {grade} ({score}/100), status {}, {} bytes{}",
            outcome.status_code,
            outcome.bytes_read,
            if outcome.truncated { " (truncated)" } else { "" }
        );

        Ok(ScanResult {
            target: target.clone(),
            findings,
            score,
            grade,
            narrative,
            created_at: Utc::now(),
            final_url: outcome.final_url,
            status_code: outcome.status_code,
            redirect_chain: outcome.redirect_chain,
            body_truncated: outcome.truncated,
            scan_duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}
