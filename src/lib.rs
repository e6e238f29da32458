//! Forage: web ingestion pipeline for retrieval-augmented chat
//!
//! Crawls a user-configured URL within its domain, splits page text into
//! overlapping chunks, and writes them to an external vector index in
//! rate-limited batches. Job admission enforces one active ingestion per
//! user with an atomic conditional status transition; a background runner
//! retries failed jobs with exponential backoff.
//!
//! Key components:
//! - `crawl`: URL rules, frontier traversal, page fetching, chunking
//! - `index`: vector index client and the batched writer
//! - `jobs`: job store (state machine) and background runner
//! - `ingest`: the orchestrator tying one job execution together
//! - `http`: axum REST API for configurations and ingestion triggers

pub mod config;
pub mod crawl;
pub mod error;
pub mod http;
pub mod index;
pub mod ingest;
pub mod jobs;
pub mod types;

pub use config::Config;
pub use error::IngestError;
pub use types::*;
