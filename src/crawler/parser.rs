//! HTML document and link extraction
//!
//! This module handles parsing HTML content to extract links to follow.
//! Parsing is deferred until the extraction pool asks for the links.

use crate::crawler::traits::Document;
use crate::{Result, TideError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

/// A downloaded HTML page
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    /// Address after redirects, used to resolve relative links
    base_url: Url,

    /// Raw page body
    body: String,
}

impl HtmlDocument {
    pub fn new(base_url: Url, body: String) -> Self {
        Self { base_url, body }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl Document for HtmlDocument {
    async fn extract_links(&self) -> Result<Vec<String>> {
        extract_links(&self.body, &self.base_url).map_err(|message| TideError::Extract {
            url: self.base_url.to_string(),
            message,
        })
    }
}

/// Extracts all links to follow from HTML content
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// Fragments are stripped, so `/page#a` and `/page#b` are the same address.
///
/// # Example
///
/// ```
/// use sumi_tide::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url).unwrap();
/// assert_eq!(links, vec!["https://example.com/page"]);
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> std::result::Result<Vec<String>, String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let a_selector = Selector::parse("a[href]").map_err(|e| e.to_string())?;
    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    let canonical_selector =
        Selector::parse("link[rel='canonical'][href]").map_err(|e| e.to_string())?;
    for element in document.select(&canonical_selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                links.push(absolute_url);
            }
        }
    }

    Ok(links)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}
