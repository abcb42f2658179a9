//! Capabilities the crawl engine consumes
//!
//! The engine never talks to the network or parses markup itself. A
//! [`Downloader`] turns an address into a [`Document`], and a document
//! yields its outbound links when asked.

use crate::Result;
use async_trait::async_trait;

/// A fetched page that can list its outbound links
#[async_trait]
pub trait Document: Send + Sync {
    /// Extracts the addresses this document links to
    ///
    /// May be slow; called at most once per document, from an extraction
    /// worker.
    async fn extract_links(&self) -> Result<Vec<String>>;
}

/// Fetches pages
///
/// Implementations are shared by every download worker and are called
/// concurrently.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads the page at `url`
    ///
    /// # Returns
    ///
    /// * `Ok(Box<dyn Document>)` - The fetched page
    /// * `Err(TideError)` - A descriptive fetch failure
    async fn download(&self, url: &str) -> Result<Box<dyn Document>>;
}
