//! Vector index endpoint configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the external vector index service.
///
/// The service embeds and upserts in one call; selection of the concrete
/// embedding provider happens behind this endpoint, not per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndexConfig {
    /// Index write endpoint (e.g. "http://localhost:6100/v1/texts")
    pub endpoint: String,
    /// API key; falls back to the FORAGE_INDEX_API_KEY environment variable
    pub api_key: Option<String>,
    /// Optional namespace attached to every write
    pub namespace: Option<String>,
    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl VectorIndexConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:6100/v1/texts".to_string(),
            api_key: None,
            namespace: None,
            timeout_secs: 30,
        }
    }
}
