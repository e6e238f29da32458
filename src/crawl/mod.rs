//! Domain-restricted web crawling and chunking
//!
//! This module implements the discovery half of the ingestion pipeline:
//! URL normalization and filtering, budgeted same-domain frontier traversal,
//! page fetching with tolerant HTML extraction, and sliding-window chunking.
//!
//! Key components:
//! - `url_rules`: pure normalize / same_domain / is_crawlable functions
//! - `Crawler`: visited-set + frontier traversal bounded by a page budget
//! - `HttpFetcher`: HTTP GET with timeout behind the `Fetch` trait
//! - `TextChunker`: overlapping chunks split on natural text boundaries

pub mod chunker;
pub mod extract;
pub mod fetcher;
pub mod frontier;
pub mod url_rules;

pub use chunker::TextChunker;
pub use fetcher::{Fetch, FetchError, FetchedPage, HttpFetcher};
pub use frontier::{CrawlError, Crawler};
pub use url_rules::{is_crawlable, normalize, same_domain};
