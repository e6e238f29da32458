//! Integration tests for the ingestion pipeline
//!
//! Wires the real store, crawler, chunker, writer, and runner together
//! against an in-memory site and index, and drives whole jobs end to end.

use async_trait::async_trait;
use forage::config::Config;
use forage::crawl::{normalize, Fetch, FetchError, FetchedPage};
use forage::index::{IndexError, VectorIndex};
use forage::ingest::{run_job, IngestContext};
use forage::jobs::{CancelFlag, JobRunner, JobStore, JobStoreError};
use forage::{IngestError, JobStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// In-memory site served by normalized URL
struct FakeSite {
    pages: HashMap<String, String>,
}

impl FakeSite {
    fn new(pages: &[(&str, String)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl Fetch for FakeSite {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        match self.pages.get(normalize(url).as_str()) {
            Some(body) => Ok(FetchedPage {
                url: url.clone(),
                body: body.clone(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// Records every write batch
#[derive(Default)]
struct RecordingIndex {
    batches: Mutex<Vec<(Vec<String>, Vec<HashMap<String, String>>)>>,
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn add_texts(
        &self,
        texts: Vec<String>,
        metadatas: Vec<HashMap<String, String>>,
    ) -> Result<(), IndexError> {
        self.batches.lock().push((texts, metadatas));
        Ok(())
    }
}

fn html_page(text: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{}\">link</a>", l))
        .collect();
    format!(
        "<html><head><title>Example</title></head><body><p>{}</p>{}</body></html>",
        text, anchors
    )
}

/// The reference scenario: a root page and /about, with a PDF and an
/// off-domain link that must both be filtered out
fn example_site() -> FakeSite {
    // Two pages of about 250 characters each
    let root_text = "Forage is a small ingestion service. It crawls a configured website, \
                     splits every page into overlapping chunks, and writes those chunks to a \
                     vector index so a chat assistant can ground its answers in the site's \
                     own content and style."
        .to_string();
    let about_text = "This page describes the project in more detail. The crawler stays on \
                      the configured domain, skips binary assets entirely, and never visits \
                      more pages than its budget allows, even when the site links back to \
                      itself in cycles."
        .to_string();

    FakeSite::new(&[
        (
            "https://example.com",
            html_page(&root_text, &["/about"]),
        ),
        (
            "https://example.com/about",
            html_page(
                &about_text,
                &["/", "/about", "/contact.pdf", "https://other.com/x"],
            ),
        ),
    ])
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawl.max_pages = 10;
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 20;
    config.writer.batch_size = 50;
    config.writer.batch_delay_ms = 0;
    config.retry.base_delay_secs = 1;
    config
}

fn build_context(site: FakeSite, index: Arc<RecordingIndex>) -> Arc<IngestContext> {
    Arc::new(IngestContext::with_parts(
        Arc::new(JobStore::new()),
        index,
        Arc::new(site),
        test_config(),
    ))
}

#[tokio::test]
async fn end_to_end_scenario() {
    let index = Arc::new(RecordingIndex::default());
    let ctx = build_context(example_site(), Arc::clone(&index));

    let job = ctx.store.create(1, "https://example.com");
    let stats = run_job(&ctx, job.id, 1, &CancelFlag::new(), false)
        .await
        .unwrap();

    // contact.pdf excluded by extension, other.com excluded by domain
    assert_eq!(stats.pages_scraped, 2);
    assert!(stats.chunks_written > 0);

    let record = ctx.store.get(job.id, 1).unwrap();
    assert_eq!(record.status, JobStatus::Completed);
    assert!(record
        .message
        .as_deref()
        .unwrap()
        .starts_with("scraped 2 pages"));

    // Each ~250-char page at chunk_size 100 / overlap 20 yields a handful of
    // overlapping chunks; sources must only ever be the two real pages
    let batches = index.batches.lock();
    let total: usize = batches.iter().map(|(texts, _)| texts.len()).sum();
    assert_eq!(total, stats.chunks_written);
    assert!(total >= 4, "expected several chunks, got {}", total);

    for (_, metadatas) in batches.iter() {
        for metadata in metadatas {
            let source = metadata.get("source").unwrap();
            assert!(
                source == "https://example.com" || source == "https://example.com/about",
                "unexpected source {}",
                source
            );
            assert_eq!(metadata.get("user_id"), Some(&"1".to_string()));
            assert_eq!(metadata.get("config_id"), Some(&job.id.to_string()));
            assert_eq!(metadata.get("title"), Some(&"Example".to_string()));
        }
    }

    // Chunk indices within each page restart at zero and stay contiguous
    let mut per_source: HashMap<String, Vec<usize>> = HashMap::new();
    for (_, metadatas) in batches.iter() {
        for metadata in metadatas {
            per_source
                .entry(metadata.get("source").unwrap().clone())
                .or_default()
                .push(metadata.get("chunk_index").unwrap().parse().unwrap());
        }
    }
    for (source, mut indices) in per_source {
        indices.sort_unstable();
        let expected: Vec<usize> = (0..indices.len()).collect();
        assert_eq!(indices, expected, "non-contiguous chunk indices for {}", source);
    }
}

#[tokio::test]
async fn single_active_job_enforced_across_api_flow() {
    let ctx = build_context(example_site(), Arc::new(RecordingIndex::default()));

    let first = ctx.store.create(1, "https://example.com");
    let second = ctx.store.create(1, "https://example.com/about");

    // Admission for the first job succeeds and blocks the second
    ctx.store.try_start(first.id, 1, false).unwrap();
    assert_eq!(
        ctx.store.try_start(second.id, 1, false),
        Err(JobStoreError::AnotherJobActive)
    );

    // Completing the first releases the user
    let err = run_job(&ctx, second.id, 1, &CancelFlag::new(), false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Store(JobStoreError::AnotherJobActive)
    ));

    run_job(&ctx, first.id, 1, &CancelFlag::new(), true)
        .await
        .unwrap();
    run_job(&ctx, second.id, 1, &CancelFlag::new(), false)
        .await
        .unwrap();

    assert_eq!(ctx.store.get(first.id, 1).unwrap().status, JobStatus::Completed);
    assert_eq!(ctx.store.get(second.id, 1).unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn runner_executes_admitted_job_in_background() {
    let index = Arc::new(RecordingIndex::default());
    let ctx = build_context(example_site(), Arc::clone(&index));
    let runner = JobRunner::new(Arc::clone(&ctx));

    let job = ctx.store.create(7, "https://example.com");
    ctx.store.try_start(job.id, 7, false).unwrap();
    runner.spawn(job.id, 7).unwrap();

    // Poll the record rather than the runner: the record is the source of
    // truth the API exposes
    for _ in 0..100 {
        if ctx.store.get(job.id, 7).unwrap().status.is_terminal() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert_eq!(ctx.store.get(job.id, 7).unwrap().status, JobStatus::Completed);
    assert!(!index.batches.lock().is_empty());
}

#[tokio::test]
async fn unreachable_site_fails_with_empty_ingestion() {
    let ctx = build_context(FakeSite::new(&[]), Arc::new(RecordingIndex::default()));

    let job = ctx.store.create(1, "https://gone.example.com");
    let err = run_job(&ctx, job.id, 1, &CancelFlag::new(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::EmptyIngestion));
    let record = ctx.store.get(job.id, 1).unwrap();
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.message.is_some());
}
