//! Error taxonomy for the ingestion pipeline
//!
//! Per-page fetch failures are recovered locally inside the crawl/chunk stage
//! and never appear here. Everything in `IngestError` is fatal to the job it
//! occurs in: the orchestrator records the message on the job and re-raises.

use crate::crawl::CrawlError;
use crate::index::IndexError;
use crate::jobs::JobStoreError;

/// Errors that terminate an ingestion job
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Bad input surfaced synchronously at trigger time; the job never starts
    #[error("invalid url: {0}")]
    Validation(String),

    /// No chunks were extracted from any crawled page. An ingestion that
    /// silently indexes nothing is worse than one that reports failure.
    #[error("no content extracted from any crawled page")]
    EmptyIngestion,

    /// Admission or transition rejected by the job store
    #[error(transparent)]
    Store(#[from] JobStoreError),

    /// Crawl-level failure (invalid seed, cancellation mid-crawl)
    #[error(transparent)]
    Crawl(#[from] CrawlError),

    /// A batch write to the vector index failed; no partial-success masking
    #[error("vector index write failed: {0}")]
    IndexWrite(#[from] IndexError),

    /// The job was cancelled between pages or between batches
    #[error("ingestion cancelled")]
    Cancelled,

    /// The background task queue refused the job (e.g. shutdown in progress)
    #[error("task infrastructure unavailable: {0}")]
    TaskInfrastructure(String),
}

impl IngestError {
    /// Message recorded on the job record, truncated to the storage limit
    pub fn job_message(&self, max_len: usize) -> String {
        truncate(&self.to_string(), max_len)
    }
}

/// Truncate a message to `max_len` bytes on a char boundary
pub(crate) fn truncate(message: &str, max_len: usize) -> String {
    if message.len() <= max_len {
        return message.to_string();
    }
    let mut end = max_len;
    while end > 0 && !message.is_char_boundary(end) {
        end -= 1;
    }
    message[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_message_unchanged() {
        assert_eq!(truncate("fetch failed", 1000), "fetch failed");
    }

    #[test]
    fn test_truncate_respects_limit() {
        let long = "x".repeat(2000);
        assert_eq!(truncate(&long, 1000).len(), 1000);
    }

    #[test]
    fn test_truncate_char_boundary() {
        // 'é' is two bytes; a cut at byte 1 would split it
        let truncated = truncate("ééé", 3);
        assert_eq!(truncated, "é");
    }

    #[test]
    fn test_empty_ingestion_message() {
        let err = IngestError::EmptyIngestion;
        assert_eq!(
            err.job_message(1000),
            "no content extracted from any crawled page"
        );
    }
}
