//! URL handling module for Sumi-Tide
//!
//! Addresses are opaque strings to the crawl engine; equality is exact string
//! equality and no normalization is performed. The only thing the engine
//! needs from a URL is the host it belongs to.

mod host;

pub use host::extract_host;
