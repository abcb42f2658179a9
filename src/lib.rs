//! Sumi-Tide: a bounded-concurrency breadth-first site crawler
//!
//! This crate walks a site level by level from a seed address, keeping the
//! number of in-flight downloads, in-flight link extractions and in-flight
//! downloads per host under fixed caps.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Tide operations
#[derive(Debug, Error)]
pub enum TideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("Failed to extract links from {url}: {message}")]
    Extract { url: String, message: String },

    #[error("Interrupted by shutdown while processing {url}")]
    Interrupted { url: String },

    #[error("The {pool} pool is closed")]
    PoolClosed { pool: &'static str },

    #[error("Crawler has been shut down")]
    Shutdown,

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TideError {
    /// Returns true if this error happened while downloading an address
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. }
                | Self::Http { .. }
                | Self::HttpStatus { .. }
                | Self::ContentMismatch { .. }
                | Self::Url(_)
        )
    }

    /// Returns true if this error happened while extracting links
    pub fn is_extract_failure(&self) -> bool {
        matches!(self, Self::Extract { .. })
    }

    /// Returns true if the work was cut short by shutdown
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL {url}: {source}")]
    Parse {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Sumi-Tide operations
pub type Result<T> = std::result::Result<T, TideError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlerConfig};
pub use crawler::{Crawler, Document, Downloader};
pub use state::CrawlResult;
pub use crate::url::extract_host;
