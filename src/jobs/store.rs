//! Job store: one record per configured URL, with atomic admission
//!
//! The whole table sits behind a single `RwLock` so the admission check and
//! the status transition happen as one step. `can_start` exists as a
//! read-only query for callers that want to report a conflict early; the
//! admission decision itself is always `try_start`.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::info;

use crate::types::{IngestJob, IngestStats, JobId, JobStatus, UserId};

/// Errors from job admission and lifecycle transitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("configuration {0} not found")]
    NotFound(JobId),

    #[error("another ingestion job is already running for this user")]
    AnotherJobActive,

    #[error("configuration {0} is already being processed")]
    AlreadyProcessing(JobId),

    #[error("configuration {job} cannot transition from {from} to {to}")]
    InvalidTransition {
        job: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("configuration {0} cannot be deleted while processing")]
    DeleteWhileProcessing(JobId),
}

/// In-memory job table.
///
/// The public methods are exactly the row operations a SQL-backed store
/// would map to; `try_start` corresponds to a single conditional UPDATE.
#[derive(Debug)]
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, IngestJob>>,
    next_id: AtomicU64,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new job in `Pending` and return it
    pub fn create(&self, user_id: UserId, url: impl Into<String>) -> IngestJob {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = IngestJob::new(id, user_id, url);
        self.jobs.write().insert(id, job.clone());
        job
    }

    /// Fetch a job owned by `user_id`
    pub fn get(&self, job_id: JobId, user_id: UserId) -> Option<IngestJob> {
        self.jobs
            .read()
            .get(&job_id)
            .filter(|job| job.user_id == user_id)
            .cloned()
    }

    /// All jobs owned by `user_id`, newest first, with offset/limit paging
    pub fn list(&self, user_id: UserId, offset: usize, limit: usize) -> Vec<IngestJob> {
        let jobs = self.jobs.read();
        let mut owned: Vec<IngestJob> = jobs
            .values()
            .filter(|job| job.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        owned.into_iter().skip(offset).take(limit).collect()
    }

    /// Total jobs owned by `user_id`
    pub fn count(&self, user_id: UserId) -> usize {
        self.jobs
            .read()
            .values()
            .filter(|job| job.user_id == user_id)
            .count()
    }

    /// Whether `user_id` may start a new job (no job of theirs Processing).
    /// Read-only; admission itself goes through `try_start`.
    pub fn can_start(&self, user_id: UserId) -> bool {
        !self
            .jobs
            .read()
            .values()
            .any(|job| job.user_id == user_id && job.status == JobStatus::Processing)
    }

    /// Atomically admit a job: verify ownership, verify no other job of this
    /// user is Processing, and transition to Processing, all under one write
    /// lock.
    ///
    /// `resume` is set by retry attempts: a job left in Processing by this
    /// task's own earlier attempt is re-run from scratch rather than
    /// rejected. Re-starting a Completed job (re-scrape) and a Failed job
    /// (retry) is always allowed.
    pub fn try_start(
        &self,
        job_id: JobId,
        user_id: UserId,
        resume: bool,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write();

        if !jobs
            .get(&job_id)
            .is_some_and(|job| job.user_id == user_id)
        {
            return Err(JobStoreError::NotFound(job_id));
        }

        if jobs
            .values()
            .any(|job| job.user_id == user_id && job.id != job_id && job.status == JobStatus::Processing)
        {
            return Err(JobStoreError::AnotherJobActive);
        }

        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;
        if job.status == JobStatus::Processing && !resume {
            return Err(JobStoreError::AlreadyProcessing(job_id));
        }

        job.status = JobStatus::Processing;
        job.message = None;
        job.updated_at = Utc::now();
        info!("job {} started for user {}", job_id, user_id);
        Ok(())
    }

    /// Transition Processing → Completed, storing the stats summary
    pub fn complete(&self, job_id: JobId, stats: &IngestStats) -> Result<(), JobStoreError> {
        self.finish(job_id, JobStatus::Completed, Some(stats.summary()))
    }

    /// Transition Processing → Failed, storing the error message verbatim.
    /// The caller truncates to the storage limit upstream.
    pub fn fail(&self, job_id: JobId, message: impl Into<String>) -> Result<(), JobStoreError> {
        self.finish(job_id, JobStatus::Failed, Some(message.into()))
    }

    fn finish(
        &self,
        job_id: JobId,
        to: JobStatus,
        message: Option<String>,
    ) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write();
        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;

        if job.status != JobStatus::Processing {
            return Err(JobStoreError::InvalidTransition {
                job: job_id,
                from: job.status,
                to,
            });
        }

        job.status = to;
        job.message = message;
        job.updated_at = Utc::now();
        info!("job {} finished as {}", job_id, to);
        Ok(())
    }

    /// Delete a job. Forbidden while Processing.
    pub fn delete(&self, job_id: JobId, user_id: UserId) -> Result<(), JobStoreError> {
        let mut jobs = self.jobs.write();

        let job = jobs
            .get(&job_id)
            .filter(|job| job.user_id == user_id)
            .ok_or(JobStoreError::NotFound(job_id))?;

        if job.status == JobStatus::Processing {
            return Err(JobStoreError::DeleteWhileProcessing(job_id));
        }

        jobs.remove(&job_id);
        Ok(())
    }

    /// Delete a user's jobs (cascade on user deletion). Returns the number
    /// of records removed.
    pub fn delete_user(&self, user_id: UserId) -> usize {
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| job.user_id != user_id);
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_create_starts_pending() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(store.get(job.id, 1).unwrap().url, "https://a.com");
    }

    #[test]
    fn test_get_enforces_ownership() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        assert!(store.get(job.id, 2).is_none());
    }

    #[test]
    fn test_single_active_job_invariant() {
        let store = JobStore::new();
        let first = store.create(1, "https://a.com");
        let second = store.create(1, "https://b.com");

        store.try_start(first.id, 1, false).unwrap();
        assert!(!store.can_start(1));
        assert_eq!(
            store.try_start(second.id, 1, false),
            Err(JobStoreError::AnotherJobActive)
        );

        // Terminal transition releases the user
        store.complete(first.id, &IngestStats::default()).unwrap();
        assert!(store.can_start(1));
        store.try_start(second.id, 1, false).unwrap();
    }

    #[test]
    fn test_can_start_true_after_failure_too() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        store.try_start(job.id, 1, false).unwrap();
        store.fail(job.id, "boom").unwrap();
        assert!(store.can_start(1));
    }

    #[test]
    fn test_other_users_unaffected() {
        let store = JobStore::new();
        let mine = store.create(1, "https://a.com");
        let theirs = store.create(2, "https://b.com");

        store.try_start(mine.id, 1, false).unwrap();
        assert!(store.can_start(2));
        store.try_start(theirs.id, 2, false).unwrap();
    }

    #[test]
    fn test_restart_processing_requires_resume() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        store.try_start(job.id, 1, false).unwrap();

        assert_eq!(
            store.try_start(job.id, 1, false),
            Err(JobStoreError::AlreadyProcessing(job.id))
        );
        // A retry attempt resumes its own Processing job from scratch
        store.try_start(job.id, 1, true).unwrap();
    }

    #[test]
    fn test_rerun_completed_job_allowed() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        store.try_start(job.id, 1, false).unwrap();
        store.complete(job.id, &IngestStats::default()).unwrap();

        // Re-scrape: starting a Completed job again is allowed
        store.try_start(job.id, 1, false).unwrap();
        let job = store.get(job.id, 1).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(job.message.is_none());
    }

    #[test]
    fn test_complete_stores_stats_summary() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        store.try_start(job.id, 1, false).unwrap();
        store
            .complete(
                job.id,
                &IngestStats {
                    pages_scraped: 2,
                    chunks_written: 9,
                    duration_ms: 5,
                },
            )
            .unwrap();

        let job = store.get(job.id, 1).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.message.as_deref(), Some("scraped 2 pages, wrote 9 chunks in 5ms"));
    }

    #[test]
    fn test_terminal_states_not_further_mutated() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        store.try_start(job.id, 1, false).unwrap();
        store.fail(job.id, "boom").unwrap();

        assert!(matches!(
            store.complete(job.id, &IngestStats::default()),
            Err(JobStoreError::InvalidTransition { .. })
        ));
        assert!(matches!(
            store.fail(job.id, "again"),
            Err(JobStoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_fail_requires_processing() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        assert!(matches!(
            store.fail(job.id, "boom"),
            Err(JobStoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_delete_rules() {
        let store = JobStore::new();
        let job = store.create(1, "https://a.com");
        store.try_start(job.id, 1, false).unwrap();

        assert_eq!(
            store.delete(job.id, 1),
            Err(JobStoreError::DeleteWhileProcessing(job.id))
        );

        store.complete(job.id, &IngestStats::default()).unwrap();
        store.delete(job.id, 1).unwrap();
        assert!(store.get(job.id, 1).is_none());
    }

    #[test]
    fn test_delete_user_cascades() {
        let store = JobStore::new();
        store.create(1, "https://a.com");
        store.create(1, "https://b.com");
        store.create(2, "https://c.com");

        assert_eq!(store.delete_user(1), 2);
        assert_eq!(store.count(1), 0);
        assert_eq!(store.count(2), 1);
    }

    #[test]
    fn test_list_pagination_newest_first() {
        let store = JobStore::new();
        for i in 0..5 {
            store.create(1, format!("https://a.com/{}", i));
        }

        let page = store.list(1, 0, 2);
        assert_eq!(page.len(), 2);
        assert!(page[0].id > page[1].id);

        let rest = store.list(1, 2, 10);
        assert_eq!(rest.len(), 3);
        assert_eq!(store.count(1), 5);
    }

    #[test]
    fn test_concurrent_admission_single_winner() {
        // Two tasks race try_start for the same user; exactly one may win
        let store = Arc::new(JobStore::new());
        let a = store.create(1, "https://a.com");
        let b = store.create(1, "https://b.com");

        let mut handles = Vec::new();
        for job_id in [a.id, b.id] {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                store.try_start(job_id, 1, false).is_ok()
            }));
        }

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();
        assert_eq!(wins, 1);
    }
}
