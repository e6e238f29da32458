//! Vector index client
//!
//! `VectorIndex` is the capability the pipeline writes against; the HTTP
//! implementation talks to an external embed-and-upsert service. Retrieval
//! happens elsewhere, scoped by the user/config metadata attached here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::VectorIndexConfig;

/// Errors from the vector index service
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds, if provided by the service
        retry_after_ms: Option<u64>,
    },

    #[error("index error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Capability to write texts (with metadata) into the vector index.
///
/// One call embeds and upserts one batch. Object-safe so the orchestrator
/// can hold `Arc<dyn VectorIndex>`.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Vec<HashMap<String, String>>,
    ) -> Result<(), IndexError>;
}

/// Write request sent to the index service
#[derive(Debug, Serialize)]
struct AddTextsRequest<'a> {
    texts: &'a [String],
    metadatas: &'a [HashMap<String, String>],
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

/// Error body returned by the index service
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for an embed-and-upsert index service
pub struct HttpVectorIndex {
    client: reqwest::Client,
    config: VectorIndexConfig,
}

impl HttpVectorIndex {
    /// Create a new client. The API key falls back to the
    /// `FORAGE_INDEX_API_KEY` environment variable.
    pub fn new(config: VectorIndexConfig) -> Result<Self, IndexError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("FORAGE_INDEX_API_KEY").ok());

        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &api_key {
            let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| IndexError::Config(format!("invalid API key format: {}", e)))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        } else {
            warn!("no API key configured for vector index {}", config.endpoint);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(IndexError::Network)?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Vec<HashMap<String, String>>,
    ) -> Result<(), IndexError> {
        debug!(
            "writing {} texts to index at {}",
            texts.len(),
            self.config.endpoint
        );

        let request = AddTextsRequest {
            texts: &texts,
            metadatas: &metadatas,
            namespace: self.config.namespace.as_deref(),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            return Err(IndexError::RateLimited { retry_after_ms });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(IndexError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
