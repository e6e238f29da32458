//! Configuration for forage

mod crawl;
mod ingest;
mod logging;
mod server;
mod vector;

pub use crawl::{ChunkingConfig, CrawlConfig};
pub use ingest::{RetryConfig, WriterConfig};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use server::ServerConfig;
pub use vector::VectorIndexConfig;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default user agent for all outbound HTTP requests
pub const DEFAULT_USER_AGENT: &str = "ForageBot/0.3 (+https://github.com/forage)";

/// Maximum length of the message persisted on a job record
pub const MAX_JOB_MESSAGE_LEN: usize = 1000;

/// Main configuration for a forage instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Crawl budgets and fetch behavior
    #[serde(default)]
    pub crawl: CrawlConfig,
    /// Chunking parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Batched vector index writer
    #[serde(default)]
    pub writer: WriterConfig,
    /// Job retry policy
    #[serde(default)]
    pub retry: RetryConfig,
    /// Vector index endpoint
    #[serde(default)]
    pub vector_index: VectorIndexConfig,
    /// HTTP API server
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields.
    ///
    /// Collects all validation errors and reports them together so the user
    /// can fix everything in one pass.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.crawl.max_pages == 0 {
            errors.push("crawl.max_pages must be positive".to_string());
        }
        if self.crawl.fetch_timeout_secs == 0 {
            errors.push("crawl.fetch_timeout_secs must be positive".to_string());
        }

        if self.chunking.chunk_size == 0 {
            errors.push("chunking.chunk_size must be positive".to_string());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            errors.push(format!(
                "chunking.chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            ));
        }

        if self.writer.batch_size == 0 {
            errors.push("writer.batch_size must be positive".to_string());
        }

        if self.vector_index.timeout_secs == 0 {
            errors.push("vector_index.timeout_secs must be positive".to_string());
        }

        if !self.server.listen_addr.is_empty() {
            if let Some(port_str) = self.server.listen_addr.rsplit(':').next() {
                if let Ok(port) = port_str.parse::<u32>() {
                    if port == 0 || port > 65535 {
                        errors.push(format!(
                            "server listen port must be between 1 and 65535, got {}",
                            port
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow::anyhow!(
                "Invalid configuration:\n  - {}",
                errors.join("\n  - ")
            ))
        }
    }

    /// Render a commented default configuration as TOML
    pub fn default_toml() -> Result<String> {
        let config = Config::default();
        Ok(toml::to_string_pretty(&config)?)
    }
}
