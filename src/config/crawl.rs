//! Crawl and chunking configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::DEFAULT_USER_AGENT;

/// Crawl budgets and fetch behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum pages visited per crawl; guarantees termination on cyclic sites
    pub max_pages: usize,
    /// Per-fetch timeout (seconds)
    pub fetch_timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Maximum response size (bytes)
    pub max_content_size: usize,
}

impl CrawlConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            fetch_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_content_size: 10 * 1024 * 1024, // 10 MB
        }
    }
}

/// Chunking parameters: target characters per chunk, shared characters
/// between consecutive chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 400,
        }
    }
}
