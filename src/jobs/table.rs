//! Job table with single-flight admission.
//!
//! Jobs and the host -> in-flight job index live under one mutex, so checking
//! for an in-flight job and inserting a new one is a single atomic step. The
//! lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use super::types::{JobError, JobSnapshot, JobStatus, ScanJob};
use crate::models::ScanResult;
use crate::security::ScanTarget;

#[derive(Default)]
struct TableInner {
    jobs: HashMap<String, ScanJob>,
    /// Host -> id of the queued or running job for it.
    inflight: HashMap<String, String>,
    queued: usize,
}

/// Result of [`JobTable::admit`].
pub(crate) enum Admission {
    Created(JobSnapshot),
    Attached(JobSnapshot),
    QueueFull,
}

pub(crate) struct JobTable {
    inner: Mutex<TableInner>,
    finished: Notify,
}

fn new_job_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

fn snapshot(id: &str, job: &ScanJob) -> JobSnapshot {
    JobSnapshot {
        job_id: id.to_string(),
        status: job.status,
        progress: job.progress,
        result: job.result.clone(),
        error: job.error.clone(),
    }
}

impl JobTable {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(TableInner::default()),
            finished: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Attaches to the in-flight job for `target`'s host or creates one.
    ///
    /// New jobs are refused once `capacity` jobs are waiting for a worker.
    pub(crate) fn admit(
        &self,
        target: &ScanTarget,
        user_id: Option<&str>,
        capacity: usize,
    ) -> Admission {
        let mut inner = self.lock();
        let key = target.key();

        if let Some(id) = inner.inflight.get(&key).cloned() {
            if let Some(job) = inner.jobs.get_mut(&id) {
                if let Some(user) = user_id {
                    if !job.subscribers.iter().any(|s| s == user) {
                        job.subscribers.push(user.to_string());
                    }
                }
                return Admission::Attached(snapshot(&id, job));
            }
        }

        if inner.queued >= capacity {
            return Admission::QueueFull;
        }

        let id = new_job_id();
        let job = ScanJob::new(target.clone(), user_id.map(str::to_string));
        let snap = snapshot(&id, &job);
        inner.jobs.insert(id.clone(), job);
        inner.inflight.insert(key, id);
        inner.queued += 1;
        Admission::Created(snap)
    }

    /// Moves a queued job to running. Returns `false` if the job is gone or
    /// already past `Queued`.
    pub(crate) fn mark_running(&self, id: &str, progress: u8) -> bool {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(id) else {
            return false;
        };
        if job.status != JobStatus::Queued {
            return false;
        }
        job.status = JobStatus::Running;
        job.progress = progress;
        inner.queued = inner.queued.saturating_sub(1);
        true
    }

    /// Raises progress of a running job. Progress never moves backwards.
    pub(crate) fn set_progress(&self, id: &str, progress: u8) {
        let mut inner = self.lock();
        if let Some(job) = inner.jobs.get_mut(id) {
            if job.status == JobStatus::Running && progress > job.progress {
                job.progress = progress.min(99);
            }
        }
    }

    /// Records success. Ignored if the job already reached a terminal state.
    pub(crate) fn complete(&self, id: &str, result: Arc<ScanResult>) -> bool {
        self.finish(id, |job| {
            job.status = JobStatus::Complete;
            job.progress = 100;
            job.result = Some(result);
        })
    }

    /// Records failure. Ignored if the job already reached a terminal state.
    pub(crate) fn fail(&self, id: &str, error: JobError) -> bool {
        self.finish(id, |job| {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        })
    }

    fn finish(&self, id: &str, apply: impl FnOnce(&mut ScanJob)) -> bool {
        let mut inner = self.lock();
        let Some(job) = inner.jobs.get_mut(id) else {
            return false;
        };
        if job.status.is_terminal() {
            return false;
        }
        let was_queued = job.status == JobStatus::Queued;
        apply(job);
        job.finished_at = Some(Instant::now());
        let key = job.target.key();
        if was_queued {
            inner.queued = inner.queued.saturating_sub(1);
        }
        if inner.inflight.get(&key).is_some_and(|current| current == id) {
            inner.inflight.remove(&key);
        }
        drop(inner);
        self.finished.notify_waiters();
        true
    }

    pub(crate) fn snapshot(&self, id: &str) -> Option<JobSnapshot> {
        let inner = self.lock();
        inner.jobs.get(id).map(|job| snapshot(id, job))
    }

    /// Users subscribed to a job's result.
    pub(crate) fn subscribers(&self, id: &str) -> Vec<String> {
        let inner = self.lock();
        inner
            .jobs
            .get(id)
            .map(|job| job.subscribers.clone())
            .unwrap_or_default()
    }

    /// Waits until job `id` is terminal or `timeout` passes, then returns its
    /// latest snapshot.
    pub(crate) async fn wait_terminal(&self, id: &str, timeout: Duration) -> Option<JobSnapshot> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.finished.notified();
            tokio::pin!(notified);
            // Register before checking so a completion in between is not missed
            notified.as_mut().enable();

            let snap = self.snapshot(id)?;
            if snap.status.is_terminal() {
                return Some(snap);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.snapshot(id);
            }
        }
    }

    /// Forgets finished jobs older than `retention`; returns how many.
    pub(crate) fn sweep(&self, retention: Duration) -> usize {
        let mut inner = self.lock();
        let before = inner.jobs.len();
        inner.jobs.retain(|_, job| {
            job.finished_at
                .map_or(true, |finished| finished.elapsed() < retention)
        });
        before - inner.jobs.len()
    }

    /// (queued, running) counts.
    pub(crate) fn counts(&self) -> (usize, usize) {
        let inner = self.lock();
        (inner.queued, inner.inflight.len().saturating_sub(inner.queued))
    }
}
