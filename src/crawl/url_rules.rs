//! URL normalization and crawl filtering
//!
//! Pure functions deciding which links a crawl may follow and what the
//! canonical identity of a URL is inside the visited set.

use url::Url;

use crate::types::CrawlUrl;

/// Path extensions that are never fetched: binary and static assets that
/// contribute no indexable text
const DENIED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".jpg", ".jpeg", ".png", ".gif",
    ".svg", ".webp", ".ico", ".bmp", ".zip", ".tar", ".gz", ".rar", ".7z", ".mp3", ".wav", ".mp4",
    ".avi", ".mov", ".wmv", ".flv", ".mkv", ".css", ".js",
];

/// Normalize a URL to its crawl identity.
///
/// Strips the fragment and any trailing slashes from the path; everything
/// else is preserved verbatim. Idempotent: normalizing an already-normalized
/// URL is a no-op.
pub fn normalize(url: &Url) -> CrawlUrl {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let path = normalized.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/');
        normalized.set_path(if trimmed.is_empty() { "/" } else { trimmed });
    }

    let mut out = normalized.to_string();
    // Url serializes an empty path as "/"; the crawl identity carries no
    // trailing slash at the root either.
    if normalized.path() == "/" && normalized.query().is_none() && out.ends_with('/') {
        out.pop();
    }

    CrawlUrl(out)
}

/// Whether the URL's host matches `base_domain` exactly.
///
/// No subdomain matching: `sub.a.com` does not belong to `a.com`. The scheme
/// is not considered.
pub fn same_domain(url: &Url, base_domain: &str) -> bool {
    url.host_str() == Some(base_domain)
}

/// Whether a URL is worth fetching at all: http/https scheme and a path that
/// does not end in a denylisted asset extension (case-insensitive).
pub fn is_crawlable(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    let path = url.path().to_ascii_lowercase();
    !DENIED_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(normalize(&parse("https://a.com/x/")).as_str(), "https://a.com/x");
    }

    #[test]
    fn test_normalize_strips_fragment() {
        assert_eq!(
            normalize(&parse("https://a.com/x#frag")).as_str(),
            "https://a.com/x"
        );
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(normalize(&parse("https://a.com/")).as_str(), "https://a.com");
        assert_eq!(normalize(&parse("https://a.com")).as_str(), "https://a.com");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in [
            "https://a.com/x/",
            "https://a.com/x#frag",
            "https://a.com/",
            "https://a.com/x//",
            "https://a.com/x?q=1",
            "https://a.com/?q=1",
            "http://b.org/path/to/page/#section",
        ] {
            let once = normalize(&parse(input));
            let twice = normalize(&Url::parse(once.as_str()).unwrap());
            assert_eq!(once, twice, "normalize not idempotent for {}", input);
        }
    }

    #[test]
    fn test_normalize_preserves_query() {
        assert_eq!(
            normalize(&parse("https://a.com/x/?q=1#frag")).as_str(),
            "https://a.com/x?q=1"
        );
    }

    #[test]
    fn test_same_domain_exact_match_only() {
        assert!(same_domain(&parse("https://a.com/p"), "a.com"));
        assert!(!same_domain(&parse("https://sub.a.com/p"), "a.com"));
        assert!(!same_domain(&parse("https://b.com/p"), "a.com"));
        // Scheme is not considered
        assert!(same_domain(&parse("http://a.com/p"), "a.com"));
    }

    #[test]
    fn test_is_crawlable_rejects_denied_extensions() {
        assert!(!is_crawlable(&parse("https://a.com/doc.pdf")));
        assert!(!is_crawlable(&parse("https://a.com/img.PNG")));
        assert!(!is_crawlable(&parse("https://a.com/app.js")));
        assert!(!is_crawlable(&parse("https://a.com/style.css")));
        assert!(!is_crawlable(&parse("https://a.com/archive.tar.gz")));
    }

    #[test]
    fn test_is_crawlable_accepts_pages() {
        assert!(is_crawlable(&parse("https://a.com/page")));
        assert!(is_crawlable(&parse("https://a.com/")));
        assert!(is_crawlable(&parse("http://a.com/about.html")));
        // Extension-looking query strings don't count
        assert!(is_crawlable(&parse("https://a.com/page?file=x.pdf")));
    }

    #[test]
    fn test_is_crawlable_rejects_non_http_schemes() {
        assert!(!is_crawlable(&parse("ftp://a.com/file")));
        assert!(!is_crawlable(&parse("mailto:someone@a.com")));
    }
}
