//! Core types for the forage ingestion pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for an ingestion job (one row per configured URL)
pub type JobId = u64;

/// Unique identifier for a user
pub type UserId = u64;

/// Lifecycle status of an ingestion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal (no automatic transitions out)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-owned ingestion job: one URL to crawl and its current status.
///
/// `message` holds the last error for failed jobs, or a stats summary for
/// completed ones. Status history is not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestJob {
    pub id: JobId,
    pub user_id: UserId,
    pub url: String,
    pub status: JobStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IngestJob {
    /// Create a new job in `Pending`
    pub fn new(id: JobId, user_id: UserId, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            url: url.into(),
            status: JobStatus::Pending,
            message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A normalized absolute URL: fragment stripped, no trailing slash on the
/// path. Two URLs differing only by fragment or trailing slash normalize to
/// the same `CrawlUrl` and are the same entity in the crawl's visited set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrawlUrl(pub(crate) String);

impl CrawlUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrawlUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CrawlUrl> for String {
    fn from(url: CrawlUrl) -> Self {
        url.0
    }
}

/// Page-level metadata captured during extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

/// A bounded slice of page text, tagged with enough metadata to scope
/// retrieval per user and per job. Written once to the vector index and not
/// retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    /// Source page URL (normalized)
    pub source: String,
    /// Zero-based position within the source page's chunk sequence
    pub chunk_index: usize,
    pub metadata: PageMetadata,
    pub user_id: UserId,
    pub job_id: JobId,
}

impl DocumentChunk {
    /// Flatten into the metadata map attached to the vector at write time.
    ///
    /// `user_id` and `config_id` are the sole isolation mechanism for
    /// multi-tenant retrieval, so they are always present.
    pub fn metadata_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("source".to_string(), self.source.clone());
        map.insert("chunk_index".to_string(), self.chunk_index.to_string());
        map.insert("user_id".to_string(), self.user_id.to_string());
        map.insert("config_id".to_string(), self.job_id.to_string());
        if let Some(title) = &self.metadata.title {
            map.insert("title".to_string(), title.clone());
        }
        if let Some(description) = &self.metadata.description {
            map.insert("description".to_string(), description.clone());
        }
        if let Some(language) = &self.metadata.language {
            map.insert("language".to_string(), language.clone());
        }
        map
    }
}

/// Aggregate statistics for one completed ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub pages_scraped: usize,
    pub chunks_written: usize,
    pub duration_ms: u64,
}

impl IngestStats {
    /// One-line summary stored on the job record at completion
    pub fn summary(&self) -> String {
        format!(
            "scraped {} pages, wrote {} chunks in {}ms",
            self.pages_scraped, self.chunks_written, self.duration_ms
        )
    }
}
