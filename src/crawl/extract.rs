//! HTML parsing: link discovery and text extraction
//!
//! Best-effort by design. Malformed markup parses to whatever the HTML5
//! algorithm recovers; a page that yields no text simply contributes no
//! chunks.

use scraper::{Html, Selector};
use url::Url;

use crate::types::PageMetadata;

/// Elements whose text content is never part of the page text
const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Extract all anchor hrefs from an HTML document, resolved against the page
/// URL. Relative links, duplicates, and unparseable hrefs are handled here;
/// domain and extension filtering is the caller's concern.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Ok(url) = base.join(href) {
                if seen.insert(url.as_str().to_string()) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Extract the page's primary text and metadata in one parse.
///
/// Block elements become paragraph breaks so the chunker can split on natural
/// boundaries; inline text is joined with single spaces.
pub fn extract_page(html: &str) -> (String, PageMetadata) {
    let document = Html::parse_document(html);

    let metadata = PageMetadata {
        title: select_text(&document, "title"),
        description: select_attr(&document, "meta[name=\"description\"]", "content"),
        language: select_attr(&document, "html", "lang"),
    };

    let mut text = String::new();
    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            // Walk up the tree: text under script/style/head is not content
            let mut skip = false;
            let mut current = node.parent();
            while let Some(parent) = current {
                if let Some(elem) = parent.value().as_element() {
                    if NON_CONTENT_ELEMENTS.contains(&elem.name()) {
                        skip = true;
                        break;
                    }
                }
                current = parent.parent();
            }
            if skip {
                continue;
            }
            let t = text_node.trim();
            if !t.is_empty() {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push(' ');
                }
                text.push_str(t);
            }
        } else if let Some(elem) = node.value().as_element() {
            match elem.name() {
                "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "li" | "blockquote" | "pre"
                | "tr" | "div" | "section" | "article" => {
                    if !text.is_empty() {
                        text.push_str("\n\n");
                    }
                }
                "br" => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }
    }

    (normalize_whitespace(&text), metadata)
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = document.select(&sel).next()?;
    let text: String = element.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let element = document.select(&sel).next()?;
    let value = element.value().attr(attr)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Collapse runs of spaces on each line and cap consecutive newlines at a
/// paragraph break
fn normalize_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut consecutive_newlines = 0u32;

    for line in text.split('\n') {
        let trimmed = line.split_whitespace().collect::<Vec<_>>().join(" ");

        if trimmed.is_empty() {
            consecutive_newlines += 1;
            continue;
        }

        if !result.is_empty() {
            if consecutive_newlines >= 1 {
                result.push_str("\n\n");
            } else {
                result.push(' ');
            }
        }

        consecutive_newlines = 0;
        result.push_str(&trimmed);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links_resolves_relative() {
        let base = Url::parse("https://example.com/page").unwrap();
        let html = r#"
            <a href="/about">About</a>
            <a href="contact">Contact</a>
            <a href="https://other.com/x">Other</a>
        "#;

        let links = extract_links(html, &base);
        assert_eq!(links.len(), 3);
        assert!(links.iter().any(|u| u.as_str() == "https://example.com/about"));
        assert!(links.iter().any(|u| u.as_str() == "https://example.com/contact"));
        assert!(links.iter().any(|u| u.as_str() == "https://other.com/x"));
    }

    #[test]
    fn test_extract_links_deduplicates() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = r#"<a href="/a">one</a><a href="/a">two</a>"#;
        assert_eq!(extract_links(html, &base).len(), 1);
    }

    #[test]
    fn test_extract_links_skips_invalid_hrefs() {
        let base = Url::parse("https://example.com/").unwrap();
        let html = r#"<a href="https://[bad">broken</a><a href="/ok">ok</a>"#;
        let links = extract_links(html, &base);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://example.com/ok");
    }

    #[test]
    fn test_extract_page_text_and_metadata() {
        let html = r#"
            <html lang="en">
            <head>
                <title>Test Page</title>
                <meta name="description" content="A test page">
                <style>body { color: red; }</style>
            </head>
            <body>
                <h1>Heading</h1>
                <p>First paragraph.</p>
                <p>Second paragraph.</p>
                <script>console.log("not content");</script>
            </body>
            </html>
        "#;

        let (text, metadata) = extract_page(html);

        assert_eq!(metadata.title.as_deref(), Some("Test Page"));
        assert_eq!(metadata.description.as_deref(), Some("A test page"));
        assert_eq!(metadata.language.as_deref(), Some("en"));

        assert!(text.contains("Heading"));
        assert!(text.contains("First paragraph."));
        assert!(text.contains("Second paragraph."));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
        // Paragraphs separated by a blank line
        assert!(text.contains("First paragraph.\n\nSecond paragraph."));
    }

    #[test]
    fn test_extract_page_tolerates_malformed_markup() {
        let html = "<html><body><p>Unclosed paragraph<div>Text</body>";
        let (text, _) = extract_page(html);
        assert!(text.contains("Unclosed paragraph"));
        assert!(text.contains("Text"));
    }

    #[test]
    fn test_extract_page_empty_document() {
        let (text, metadata) = extract_page("");
        assert!(text.is_empty());
        assert!(metadata.title.is_none());
    }
}
