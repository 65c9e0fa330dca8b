//! site_posture library: passive website security posture scans
//!
//! Scans a user-supplied host for HTTP security headers, HTTPS use, cookie
//! flags and email DNS records, and grades the result. Every address the
//! scanner connects to is checked first, including the targets of redirects,
//! so the service cannot be turned against internal networks.
//!
//! # Example
//!
//! ```no_run
//! use site_posture::{run_server, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     listen: "127.0.0.1:8080".to_string(),
//!     workers: 4,
//!     ..Default::default()
//! };
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod api_server;
pub mod config;
pub mod dns;
pub mod engine;
pub mod error_handling;
pub mod fetch;
pub mod findings;
pub mod initialization;
pub mod jobs;
pub mod models;
pub mod scoring;
pub mod security;
pub mod storage;
mod utils;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use engine::ScanEngine;
pub use error_handling::{FetchError, ScanError, ValidationError};
pub use jobs::{Caller, JobSnapshot, JobStatus, Orchestrator, SubmitOutcome};
pub use models::ScanResult;
pub use run::run_server;

// Internal run module (wires the service together)
mod run {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use chrono::Utc;
    use log::{info, warn};
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    use crate::api_server::{start_api_server, ApiState};
    use crate::config::{Config, DNS_TIMEOUT_SECS, HISTORY_PRUNE_INTERVAL};
    use crate::dns::HostLookup;
    use crate::engine::ScanEngine;
    use crate::error_handling::ProcessingStats;
    use crate::fetch::SafeFetcher;
    use crate::initialization::init_resolver;
    use crate::jobs::Orchestrator;
    use crate::security::AddressGuard;
    use crate::storage::{init_db_pool_with_path, run_migrations, HistoryStore, SqliteHistory};

    /// Interval between job table and cache sweeps.
    const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

    /// Runs the scan service until Ctrl-C.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The DNS resolver cannot be initialized
    /// - The history database cannot be opened or migrated
    /// - The listen address cannot be bound
    pub async fn run_server(config: Config) -> Result<()> {
        let lookup: Arc<dyn HostLookup> = Arc::new(
            init_resolver(Duration::from_secs(DNS_TIMEOUT_SECS))
                .context("Failed to initialize DNS resolver")?,
        );
        let guard = AddressGuard::with_allowed(config.allow_addresses.iter().copied());
        if !config.allow_addresses.is_empty() {
            warn!(
                "Address guard exemptions active for {} address(es)",
                config.allow_addresses.len()
            );
        }

        let fetcher = SafeFetcher::new(Arc::clone(&lookup), guard.clone(), config.fetch_limits());
        let engine = ScanEngine::new(lookup, guard, fetcher);

        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        let history: Arc<dyn HistoryStore> = Arc::new(SqliteHistory::new(pool));

        let settings = config.orchestrator_settings();
        info!(
            "Starting scanner: {} workers, queue capacity {}, job timeout {}s",
            settings.workers,
            settings.queue_capacity,
            settings.job_timeout.as_secs()
        );
        let orchestrator = Arc::new(Orchestrator::new(
            engine,
            settings,
            Arc::new(ProcessingStats::new()),
            Some(Arc::clone(&history)),
        ));

        let listener = tokio::net::TcpListener::bind(&config.listen)
            .await
            .with_context(|| format!("Failed to bind API server to {}", config.listen))?;

        let shutdown = CancellationToken::new();
        let maintenance = tokio::spawn(run_maintenance(
            Arc::clone(&orchestrator),
            Arc::clone(&history),
            config.history_retention_days,
            shutdown.clone(),
        ));

        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Shutdown requested");
                }
                shutdown.cancel();
            });
        }

        let state = ApiState::new(orchestrator, Some(history));
        let served = start_api_server(listener, state, shutdown.clone()).await;

        shutdown.cancel();
        join_background("maintenance", maintenance).await;
        served
    }

    /// Waits for a background task, logging how it ended if it did not
    /// return normally. Returns whether it did.
    async fn join_background(name: &str, handle: JoinHandle<()>) -> bool {
        match handle.await {
            Ok(()) => true,
            Err(e) if e.is_panic() => {
                warn!("Background task {name} panicked: {e}");
                false
            }
            Err(e) => {
                warn!("Background task {name} did not finish: {e}");
                false
            }
        }
    }

    /// Periodically sweeps finished jobs and expired cache entries, and prunes
    /// history past retention.
    async fn run_maintenance(
        orchestrator: Arc<Orchestrator>,
        history: Arc<dyn HistoryStore>,
        retention_days: i64,
        shutdown: CancellationToken,
    ) {
        let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
        let mut prune = tokio::time::interval(HISTORY_PRUNE_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sweep.tick() => orchestrator.sweep().await,
                _ = prune.tick() => {
                    let cutoff = Utc::now() - chrono::Duration::days(retention_days.max(1));
                    match history.prune_older_than(cutoff).await {
                        Ok(0) => {}
                        Ok(n) => info!("Pruned {n} history entries older than {retention_days} days"),
                        Err(e) => warn!("History pruning failed: {e}"),
                    }
                }
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_join_background_reports_panics() {
            let clean = tokio::spawn(async {});
            assert!(join_background("clean", clean).await);

            let panicked = tokio::spawn(async { panic!("sweep failed") });
            assert!(!join_background("panicked", panicked).await);

            let aborted = tokio::spawn(std::future::pending::<()>());
            aborted.abort();
            assert!(!join_background("aborted", aborted).await);
        }
    }
}
