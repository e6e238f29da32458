//! Background job execution
//!
//! Jobs run as fire-and-forget tokio tasks: the caller gets a task id back
//! immediately and reads progress from the job record. The wrapper re-runs
//! the whole pipeline on failure with exponential backoff; a retried attempt
//! treats its own leftover Processing status as resumable-from-scratch.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::IngestError;
use crate::ingest::{run_job, IngestContext};
use crate::jobs::CancelFlag;
use crate::types::{IngestStats, JobId, UserId};

/// Handle identifying one background task
pub type TaskId = Uuid;

struct TaskHandle {
    job_id: JobId,
    cancel: CancelFlag,
}

/// Spawns and tracks background ingestion tasks
pub struct JobRunner {
    ctx: Arc<IngestContext>,
    tasks: DashMap<TaskId, TaskHandle>,
    accepting: AtomicBool,
}

impl JobRunner {
    pub fn new(ctx: Arc<IngestContext>) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            tasks: DashMap::new(),
            accepting: AtomicBool::new(true),
        })
    }

    /// Spawn an ingestion task for an already-admitted job. Returns the task
    /// handle immediately; the job record carries the outcome.
    pub fn spawn(self: &Arc<Self>, job_id: JobId, user_id: UserId) -> Result<TaskId, IngestError> {
        if !self.accepting.load(Ordering::Relaxed) {
            return Err(IngestError::TaskInfrastructure(
                "runner is shutting down".to_string(),
            ));
        }

        let task_id = Uuid::new_v4();
        let cancel = CancelFlag::new();
        self.tasks.insert(
            task_id,
            TaskHandle {
                job_id,
                cancel: cancel.clone(),
            },
        );

        let runner = Arc::clone(self);
        tokio::spawn(async move {
            // The caller admitted the job via try_start before spawning, so
            // the first attempt already resumes a Processing record
            match run_with_retry(&runner.ctx, job_id, user_id, &cancel, true).await {
                Ok(stats) => info!("job {} finished: {}", job_id, stats.summary()),
                Err(e) => error!("job {} failed permanently: {}", job_id, e),
            }
            runner.tasks.remove(&task_id);
        });

        Ok(task_id)
    }

    /// Number of tasks currently running
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Whether any running task belongs to the given job
    pub fn is_running(&self, job_id: JobId) -> bool {
        self.tasks.iter().any(|entry| entry.job_id == job_id)
    }

    /// Stop accepting new jobs and cancel all running tasks. In-flight
    /// network calls finish; the tasks stop at the next page or batch.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Relaxed);
        for entry in self.tasks.iter() {
            entry.cancel.cancel();
        }
        info!("job runner shutting down ({} tasks cancelled)", self.tasks.len());
    }
}

/// Run one job to a terminal state, retrying the entire pipeline on failure.
///
/// Attempt `n` sleeps `base_delay * 2^n` before re-running. `resume` applies
/// to the first attempt only; retries always resume (their own previous
/// attempt left the record Processing or Failed).
pub async fn run_with_retry(
    ctx: &IngestContext,
    job_id: JobId,
    user_id: UserId,
    cancel: &CancelFlag,
    resume: bool,
) -> Result<IngestStats, IngestError> {
    let retry = ctx.config.retry.clone();
    let mut attempt: u32 = 0;

    loop {
        let resume_attempt = resume || attempt > 0;
        match run_job(ctx, job_id, user_id, cancel, resume_attempt).await {
            Ok(stats) => return Ok(stats),
            Err(err) => {
                if !is_retryable(&err) || attempt >= retry.max_retries {
                    return Err(err);
                }
                let backoff = retry.backoff(attempt);
                warn!(
                    "job {} attempt {} failed: {}; retrying in {:?}",
                    job_id,
                    attempt + 1,
                    err,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                if cancel.is_cancelled() {
                    return Err(IngestError::Cancelled);
                }
                attempt += 1;
            }
        }
    }
}

/// Whether a failure is worth re-running the pipeline for. Bad input,
/// missing records, admission conflicts, and cancellations will not improve
/// on retry.
fn is_retryable(err: &IngestError) -> bool {
    use crate::jobs::JobStoreError;
    !matches!(
        err,
        IngestError::Cancelled
            | IngestError::Validation(_)
            | IngestError::Crawl(_)
            | IngestError::Store(
                JobStoreError::NotFound(_)
                    | JobStoreError::AnotherJobActive
                    | JobStoreError::AlreadyProcessing(_)
            )
    )
}
