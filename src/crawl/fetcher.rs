//! Page fetching
//!
//! One HTTP client per crawler, bounded by the configured per-request
//! timeout. The `Fetch` trait is the seam the crawler and orchestrator are
//! written against; tests substitute an in-memory site graph.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::CrawlConfig;

/// Errors that can occur while fetching a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("content too large: {0} bytes")]
    ContentTooLarge(usize),
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The fetched URL (may differ from the request after redirects)
    pub url: Url,
    /// Raw HTML body, lossily decoded to UTF-8
    pub body: String,
}

/// Capability to fetch one page. Implemented by `HttpFetcher` in production
/// and by in-memory fakes in tests.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// HTTP page fetcher backed by a pooled reqwest client
pub struct HttpFetcher {
    client: reqwest::Client,
    max_content_size: usize,
}

impl HttpFetcher {
    /// Create a fetcher from crawl configuration
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout())
            .connect_timeout(Duration::from_secs(config.fetch_timeout_secs.min(10)))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_content_size: config.max_content_size,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html")
            && !content_type.contains("application/xhtml")
            && !content_type.contains("text/plain")
        {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_content_size {
                return Err(FetchError::ContentTooLarge(len as usize));
            }
        }

        // Lossy decode: non-UTF8 bodies must not abort a crawl
        let bytes = response.bytes().await?;
        if bytes.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(bytes.len()));
        }
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}
