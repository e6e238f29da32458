//! Writer batching and job retry configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batched vector index writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Maximum chunks per index write call. Kept below the embedding
    /// provider's per-minute request ceiling.
    pub batch_size: usize,
    /// Delay between consecutive batches (milliseconds); not applied after
    /// the last batch
    pub batch_delay_ms: u64,
}

impl WriterConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_delay_ms: 1000,
        }
    }
}

/// Retry policy for the outer job wrapper: the whole pipeline is re-run on
/// any uncaught failure, up to `max_retries` times, with exponential backoff
/// of `base_delay_secs * 2^attempt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_secs: u64,
}

impl RetryConfig {
    /// Backoff before retrying after the given zero-based attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_delay_secs.saturating_mul(1u64 << attempt.min(16)))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 60,
        }
    }
}
