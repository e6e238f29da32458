//! Job lifecycle management
//!
//! The job store holds one record per configured URL and enforces the
//! single-active-job-per-user invariant with an atomic conditional
//! transition. The runner executes jobs on background tasks with a
//! retry-with-backoff wrapper.

pub mod runner;
pub mod store;

pub use runner::{JobRunner, TaskId};
pub use store::{JobStore, JobStoreError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Polled cancellation flag, checked between pages and between batches.
/// A cancelled job finishes its current network call and then stops.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
