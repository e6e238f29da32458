//! HTTP API request/response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{IngestJob, JobId, JobStatus};

/// Create-configuration request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConfigurationRequest {
    /// URL to crawl and ingest
    pub url: String,
}

/// Configuration as exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationResponse {
    pub id: JobId,
    pub url: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&IngestJob> for ConfigurationResponse {
    fn from(job: &IngestJob) -> Self {
        Self {
            id: job.id,
            url: job.url.clone(),
            status: job.status,
            // The message column doubles as a stats summary on completion;
            // only failures surface it as an error
            error_message: match job.status {
                JobStatus::Failed => job.message.clone(),
                _ => None,
            },
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Paginated configuration list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationListResponse {
    pub total: usize,
    pub items: Vec<ConfigurationResponse>,
    pub page: usize,
    pub page_size: usize,
}

/// List query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

/// Trigger-ingestion request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartIngestionRequest {
    pub config_id: JobId,
}

/// Trigger-ingestion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartIngestionResponse {
    pub message: String,
    pub task_id: String,
    pub config_id: JobId,
    pub status: JobStatus,
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
}
