//! Configuration module for Sumi-Tide
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to single-worker defaults.
//!
//! # Example
//!
//! ```no_run
//! use sumi_tide::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tide.toml")).unwrap();
//! println!("Crawler will visit {} levels", config.crawler.depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, HttpConfig, UserAgentConfig};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub(crate) use validation::validate_pool_sizes;
pub use validation::{validate, validate_crawler_config};
