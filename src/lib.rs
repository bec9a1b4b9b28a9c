//! Docmark: a polite documentation crawler
//!
//! This crate crawls a documentation site (or a sitemap) breadth-first,
//! converts each HTML page to Markdown, and persists the result through a
//! pluggable storage backend, while respecting robots.txt and rate limits.

pub mod config;
pub mod crawler;
pub mod markdown;
pub mod ratelimit;
pub mod robots;
pub mod sitemap;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Docmark operations
#[derive(Debug, Error)]
pub enum DocmarkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request for {url} failed after {attempts} attempts: {message}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    #[error("Content for {url} exceeds maximum size of {max_bytes} bytes")]
    ContentTooLarge { url: String, max_bytes: u64 },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl DocmarkError {
    /// Returns true if this error represents a single-page failure that the
    /// crawl loop records and moves past, as opposed to a startup error.
    pub fn is_page_local(&self) -> bool {
        matches!(
            self,
            DocmarkError::Http { .. }
                | DocmarkError::FetchExhausted { .. }
                | DocmarkError::ContentTooLarge { .. }
                | DocmarkError::HttpStatus { .. }
                | DocmarkError::Storage(_)
        )
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

/// Result type alias for Docmark operations
pub type Result<T> = std::result::Result<T, DocmarkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlStats};
pub use markdown::{ConvertOptions, MarkdownConverter};
