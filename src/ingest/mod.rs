//! Ingestion orchestration
//!
//! One job execution end to end: admit the job, crawl the configured URL,
//! chunk every discovered page, write the chunks to the vector index, and
//! record the terminal status. Per-page failures degrade the result;
//! write-stage failures abort it.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use url::Url;

use crate::config::{Config, MAX_JOB_MESSAGE_LEN};
use crate::crawl::{extract, CrawlError, Crawler, Fetch, HttpFetcher, TextChunker};
use crate::error::IngestError;
use crate::index::{BatchedWriter, HttpVectorIndex, VectorIndex};
use crate::jobs::{CancelFlag, JobStore, JobStoreError};
use crate::types::{CrawlUrl, DocumentChunk, IngestStats, JobId, UserId};

/// Dependency-injected context shared by the orchestrator, the runner, and
/// the API handlers. Constructed once at process startup; tests build it
/// from fakes.
pub struct IngestContext {
    pub store: Arc<JobStore>,
    pub index: Arc<dyn VectorIndex>,
    pub fetcher: Arc<dyn Fetch>,
    pub config: Config,
}

impl IngestContext {
    /// Build the production context from configuration
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.crawl)?;
        let index = HttpVectorIndex::new(config.vector_index.clone())?;
        Ok(Self {
            store: Arc::new(JobStore::new()),
            index: Arc::new(index),
            fetcher: Arc::new(fetcher),
            config,
        })
    }

    /// Assemble a context from explicit parts
    pub fn with_parts(
        store: Arc<JobStore>,
        index: Arc<dyn VectorIndex>,
        fetcher: Arc<dyn Fetch>,
        config: Config,
    ) -> Self {
        Self {
            store,
            index,
            fetcher,
            config,
        }
    }
}

/// Execute one ingestion job to its terminal status.
///
/// Fails fast with `NotFound` before any state change if the job is missing
/// or not owned by `user_id`. After admission, any error is recorded as the
/// job's message (truncated to the storage limit) via `fail` and re-raised.
/// Already-written vectors are not rolled back; the index is append-only.
pub async fn run_job(
    ctx: &IngestContext,
    job_id: JobId,
    user_id: UserId,
    cancel: &CancelFlag,
    resume: bool,
) -> Result<IngestStats, IngestError> {
    let job = ctx
        .store
        .get(job_id, user_id)
        .ok_or(IngestError::Store(JobStoreError::NotFound(job_id)))?;

    let seed = Url::parse(&job.url)
        .map_err(|e| IngestError::Validation(format!("bad configured url '{}': {}", job.url, e)))?;

    ctx.store.try_start(job_id, user_id, resume)?;
    info!("ingestion started for job {} ({})", job_id, job.url);

    match run_pipeline(ctx, &seed, job_id, user_id, cancel).await {
        Ok(stats) => {
            ctx.store.complete(job_id, &stats)?;
            info!("ingestion completed for job {}: {}", job_id, stats.summary());
            Ok(stats)
        }
        Err(err) => {
            let message = err.job_message(MAX_JOB_MESSAGE_LEN);
            if let Err(store_err) = ctx.store.fail(job_id, message) {
                warn!(
                    "could not record failure for job {}: {} (original error: {})",
                    job_id, store_err, err
                );
            }
            Err(err)
        }
    }
}

/// Crawl, chunk, and write. Does not touch job status.
async fn run_pipeline(
    ctx: &IngestContext,
    seed: &Url,
    job_id: JobId,
    user_id: UserId,
    cancel: &CancelFlag,
) -> Result<IngestStats, IngestError> {
    let started = Instant::now();

    let crawler = Crawler::new(ctx.fetcher.as_ref(), &ctx.config.crawl);
    let pages = crawler.crawl(seed, cancel).await.map_err(|e| match e {
        CrawlError::Cancelled => IngestError::Cancelled,
        other => IngestError::Crawl(other),
    })?;
    info!("crawl of {} discovered {} pages", seed, pages.len());

    let chunker = TextChunker::from_config(&ctx.config.chunking);
    let mut chunks: Vec<DocumentChunk> = Vec::new();
    for page in &pages {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }
        chunks.extend(fetch_and_chunk(ctx, &chunker, page, user_id, job_id).await);
    }

    // An ingestion that indexes nothing must fail rather than complete
    if chunks.is_empty() {
        return Err(IngestError::EmptyIngestion);
    }

    let writer = BatchedWriter::new(Arc::clone(&ctx.index), ctx.config.writer.clone());
    let written = writer.write_all(&chunks, cancel).await?;

    Ok(IngestStats {
        pages_scraped: pages.len(),
        chunks_written: written,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Fetch one page and split it into tagged chunks.
///
/// Per-page failure is an empty result, not an error: one bad page must not
/// abort a multi-page ingestion.
async fn fetch_and_chunk(
    ctx: &IngestContext,
    chunker: &TextChunker,
    page: &CrawlUrl,
    user_id: UserId,
    job_id: JobId,
) -> Vec<DocumentChunk> {
    let url = match Url::parse(page.as_str()) {
        Ok(u) => u,
        Err(e) => {
            warn!("skipping unparseable page url {}: {}", page, e);
            return Vec::new();
        }
    };

    let fetched = match ctx.fetcher.fetch(&url).await {
        Ok(page) => page,
        Err(e) => {
            warn!("fetch failed for {} during chunking: {}", page, e);
            return Vec::new();
        }
    };

    let (text, metadata) = extract::extract_page(&fetched.body);
    chunker.chunk_page(page, &text, &metadata, user_id, job_id)
}
