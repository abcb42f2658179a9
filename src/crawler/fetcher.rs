//! HTTP downloader implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification into fetch failures

use crate::config::{HttpConfig, UserAgentConfig};
use crate::crawler::parser::HtmlDocument;
use crate::crawler::traits::{Document, Downloader};
use crate::{Result, TideError, UrlError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use sumi_tide::config::{HttpConfig, UserAgentConfig};
/// use sumi_tide::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads pages over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader from configuration
    pub fn new(user_agent: &UserAgentConfig, http: &HttpConfig) -> Result<Self> {
        let client = build_http_client(user_agent, http)
            .map_err(|e| TideError::Runtime(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Creates a downloader around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>> {
        let parsed = Url::parse(url).map_err(|source| UrlError::Parse {
            url: url.to_string(),
            source,
        })?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| classify(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TideError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(TideError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|source| classify(url, source))?;

        tracing::trace!("Fetched {} ({} bytes)", final_url, body.len());
        Ok(Box::new(HtmlDocument::new(final_url, body)))
    }
}

/// Turns a transport error into a fetch failure with a readable reason
fn classify(url: &str, source: reqwest::Error) -> TideError {
    if source.is_timeout() {
        TideError::Fetch {
            url: url.to_string(),
            message: "Request timeout".to_string(),
        }
    } else if source.is_connect() {
        TideError::Fetch {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        TideError::Http {
            url: url.to_string(),
            source,
        }
    }
}
