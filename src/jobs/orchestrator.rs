//! Scan job orchestration.
//!
//! Submissions pass the rate limiter, are normalized without I/O, and are then
//! answered from cache, attached to an in-flight job for the same host, or
//! queued as a new job. Each job runs on its own task once it holds a worker
//! permit; the scan itself runs on an inner task so a panic surfaces as a
//! `JoinError` and fails only that job.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::cache::ResultCache;
use super::rate_limit::ClientRateLimiter;
use super::table::{Admission, JobTable};
use super::types::{Caller, JobError, JobSnapshot, SubmitOutcome};
use crate::config::OrchestratorSettings;
use crate::engine::{progress, ScanEngine};
use crate::error_handling::{EventType, FetchError, ProcessingStats, ScanError};
use crate::initialization::init_semaphore;
use crate::models::ScanResult;
use crate::security::{normalize_input, ScanTarget};
use crate::storage::HistoryStore;
use crate::utils::sanitize_and_truncate_error_message;

/// Shared orchestration state. One instance serves every submission.
pub struct Orchestrator {
    engine: ScanEngine,
    table: Arc<JobTable>,
    cache: Arc<ResultCache>,
    limiter: ClientRateLimiter,
    permits: Arc<Semaphore>,
    stats: Arc<ProcessingStats>,
    history: Option<Arc<dyn HistoryStore>>,
    settings: OrchestratorSettings,
}

/// Everything a job task needs, cloned out of the orchestrator.
#[derive(Clone)]
struct JobContext {
    engine: ScanEngine,
    table: Arc<JobTable>,
    cache: Arc<ResultCache>,
    permits: Arc<Semaphore>,
    stats: Arc<ProcessingStats>,
    history: Option<Arc<dyn HistoryStore>>,
    job_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        engine: ScanEngine,
        settings: OrchestratorSettings,
        stats: Arc<ProcessingStats>,
        history: Option<Arc<dyn HistoryStore>>,
    ) -> Self {
        Self {
            engine,
            table: Arc::new(JobTable::new()),
            cache: Arc::new(ResultCache::new(settings.cache_ttl)),
            limiter: ClientRateLimiter::new(settings.rate_limit, settings.rate_limit_window),
            permits: init_semaphore(settings.workers.max(1)),
            stats,
            history,
            settings,
        }
    }

    /// Submits `input` on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - `RateLimited` when the caller spent its submission budget
    /// - `InvalidInput` / `UnsafeTarget` when the input fails validation
    /// - `Busy` when the queue is full
    pub async fn submit(&self, input: &str, caller: &Caller) -> Result<SubmitOutcome, ScanError> {
        if !self.limiter.try_acquire(&caller.client_key).await {
            self.stats.increment(EventType::RateLimited);
            log::info!("Rate limited client {}", caller.client_key);
            return Err(ScanError::RateLimited(caller.client_key.clone()));
        }

        let target = normalize_input(input, self.engine.guard()).map_err(|e| {
            self.stats.increment(EventType::RejectedInput);
            log::info!("Rejected submission from {}: {e}", caller.client_key);
            ScanError::from(e)
        })?;

        if let Some(result) = self.cache.get(&target.key()) {
            self.stats.increment(EventType::CacheHit);
            log::debug!("Cache hit for {}", target.key());
            return Ok(SubmitOutcome::Cached(result));
        }

        self.table.sweep(self.settings.job_retention);

        match self.table.admit(
            &target,
            caller.user_id.as_deref(),
            self.settings.queue_capacity,
        ) {
            Admission::Attached(snapshot) => {
                self.stats.increment(EventType::Deduplicated);
                log::debug!("Attached to job {} for {}", snapshot.job_id, target.key());
                Ok(SubmitOutcome::Attached(snapshot))
            }
            Admission::QueueFull => {
                self.stats.increment(EventType::QueueFull);
                log::warn!("Queue full, refusing scan of {}", target.key());
                Err(ScanError::Busy)
            }
            Admission::Created(snapshot) => {
                self.stats.increment(EventType::JobQueued);
                log::info!("Queued job {} for {target}", snapshot.job_id);
                tokio::spawn(run_job(
                    self.context(),
                    snapshot.job_id.clone(),
                    target,
                ));
                Ok(SubmitOutcome::Queued(snapshot))
            }
        }
    }

    /// Current state of job `job_id`.
    pub fn status(&self, job_id: &str) -> Result<JobSnapshot, ScanError> {
        self.table
            .snapshot(job_id)
            .ok_or_else(|| ScanError::NotFound(job_id.to_string()))
    }

    /// Waits up to `timeout` for job `job_id` to finish.
    pub async fn wait(&self, job_id: &str, timeout: Duration) -> Result<JobSnapshot, ScanError> {
        self.table
            .wait_terminal(job_id, timeout)
            .await
            .ok_or_else(|| ScanError::NotFound(job_id.to_string()))
    }

    /// Drops expired cache entries, finished jobs past retention and idle
    /// rate-limit buckets.
    pub async fn sweep(&self) {
        let jobs = self.table.sweep(self.settings.job_retention);
        let cached = self.cache.purge_expired();
        self.limiter.sweep().await;
        if jobs + cached > 0 {
            log::debug!("Swept {jobs} finished jobs and {cached} cached results");
        }
    }

    /// (queued, running, cached) counts.
    pub fn load(&self) -> (usize, usize, usize) {
        let (queued, running) = self.table.counts();
        (queued, running, self.cache.len())
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    fn context(&self) -> JobContext {
        JobContext {
            engine: self.engine.clone(),
            table: Arc::clone(&self.table),
            cache: Arc::clone(&self.cache),
            permits: Arc::clone(&self.permits),
            stats: Arc::clone(&self.stats),
            history: self.history.clone(),
            job_timeout: self.settings.job_timeout,
        }
    }
}

async fn run_job(ctx: JobContext, job_id: String, target: ScanTarget) {
    let _permit = match Arc::clone(&ctx.permits).acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            log::error!("Worker pool closed before job {job_id} started: {e}");
            ctx.table
                .fail(&job_id, JobError::from(&ScanError::Internal(e.to_string())));
            return;
        }
    };
    if !ctx.table.mark_running(&job_id, progress::STARTED) {
        return;
    }

    let mut work = {
        let engine = ctx.engine.clone();
        let table = Arc::clone(&ctx.table);
        let id = job_id.clone();
        let target = target.clone();
        tokio::spawn(async move {
            let report = move |p: u8| table.set_progress(&id, p);
            engine.run(&target, &report).await
        })
    };

    match tokio::time::timeout(ctx.job_timeout, &mut work).await {
        Ok(Ok(Ok(result))) => {
            let result = Arc::new(result);
            // Cached before the job turns terminal
            ctx.cache.insert(&target.key(), Arc::clone(&result));
            ctx.table.complete(&job_id, Arc::clone(&result));
            ctx.stats.increment(EventType::JobCompleted);
            record_history(&ctx, &job_id, &result).await;
        }
        Ok(Ok(Err(e))) => {
            if matches!(&e, ScanError::Fetch(FetchError::UnsafeRedirect { .. })) {
                ctx.stats.increment(EventType::UnsafeRedirect);
            }
            log::warn!(
                "Job {job_id} for {target} failed: {}",
                sanitize_and_truncate_error_message(&e.to_string())
            );
            ctx.table.fail(&job_id, JobError::from(&e));
            ctx.stats.increment(EventType::JobFailed);
        }
        Ok(Err(join_error)) => {
            log::error!("Job {job_id} for {target} panicked: {join_error}");
            ctx.table.fail(
                &job_id,
                JobError::from(&ScanError::Internal(join_error.to_string())),
            );
            ctx.stats.increment(EventType::JobPanicked);
        }
        Err(_) => {
            work.abort();
            log::warn!(
                "Job {job_id} for {target} exceeded {}s and was stopped",
                ctx.job_timeout.as_secs()
            );
            ctx.table.fail(&job_id, JobError::from(&ScanError::Timeout));
            ctx.stats.increment(EventType::JobTimedOut);
        }
    }
}

async fn record_history(ctx: &JobContext, job_id: &str, result: &ScanResult) {
    let Some(history) = &ctx.history else {
        return;
    };
    for user_id in ctx.table.subscribers(job_id) {
        if let Err(e) = history.append(&user_id, result).await {
            ctx.stats.increment(EventType::HistoryWriteFailed);
            log::warn!("History write for job {job_id} failed: {e}");
        }
    }
}
