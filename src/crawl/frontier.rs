//! Frontier crawler: budgeted same-domain link discovery
//!
//! Maintains two disjoint sets of normalized URLs — `visited` and `frontier`
//! — and walks the site graph until the frontier drains or the page budget
//! is spent. Frontier removal order is arbitrary (it is a hash set, not a
//! queue); callers must not rely on breadth-first ordering, only on every
//! reachable page up to the budget eventually being visited.

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::jobs::CancelFlag;
use crate::types::CrawlUrl;

use super::extract::extract_links;
use super::fetcher::Fetch;
use super::url_rules::{is_crawlable, normalize, same_domain};

/// Errors that abort a crawl as a whole. Single-page fetch failures are not
/// among them: those are logged and the page contributes zero links.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid seed url '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },
    #[error("crawl cancelled")]
    Cancelled,
}

/// Same-domain crawler bounded by a page budget
pub struct Crawler<'a> {
    fetcher: &'a dyn Fetch,
    config: &'a CrawlConfig,
}

impl<'a> Crawler<'a> {
    pub fn new(fetcher: &'a dyn Fetch, config: &'a CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    /// Discover all same-domain crawlable URLs reachable from `seed`, up to
    /// `max_pages`. Returns the visited set; order is unspecified.
    ///
    /// Termination is guaranteed by the budget even on sites with cyclic or
    /// unbounded link structure.
    pub async fn crawl(
        &self,
        seed: &Url,
        cancel: &CancelFlag,
    ) -> Result<Vec<CrawlUrl>, CrawlError> {
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(CrawlError::InvalidSeed {
                url: seed.to_string(),
                reason: format!("unsupported scheme '{}'", seed.scheme()),
            });
        }
        let base_domain = seed
            .host_str()
            .ok_or_else(|| CrawlError::InvalidSeed {
                url: seed.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_string();

        let mut visited: HashSet<CrawlUrl> = HashSet::new();
        let mut frontier: HashSet<CrawlUrl> = HashSet::new();
        frontier.insert(normalize(seed));

        while visited.len() < self.config.max_pages {
            // Arbitrary removal order
            let Some(next) = frontier.iter().next().cloned() else {
                break;
            };
            frontier.remove(&next);

            if cancel.is_cancelled() {
                return Err(CrawlError::Cancelled);
            }
            if visited.contains(&next) {
                continue;
            }

            let page_url = match Url::parse(next.as_str()) {
                Ok(u) => u,
                Err(e) => {
                    warn!("skipping unparseable frontier url {}: {}", next, e);
                    visited.insert(next);
                    continue;
                }
            };

            // Fetch-attempted pages count against the budget either way
            visited.insert(next.clone());

            let page = match self.fetcher.fetch(&page_url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("fetch failed for {}: {}", next, e);
                    continue;
                }
            };

            let mut discovered = 0usize;
            for link in extract_links(&page.body, &page.url) {
                if !same_domain(&link, &base_domain) || !is_crawlable(&link) {
                    continue;
                }
                let normalized = normalize(&link);
                if !visited.contains(&normalized) && !frontier.contains(&normalized) {
                    frontier.insert(normalized);
                    discovered += 1;
                }
            }
            debug!(
                "visited {} ({} new urls, {} visited, {} queued)",
                next,
                discovered,
                visited.len(),
                frontier.len()
            );
        }

        Ok(visited.into_iter().collect())
    }
}
