use crate::markdown::ConvertOptions;
use crate::storage::StorageConfig;
use serde::Deserialize;

/// Default delay between requests in seconds
pub const DEFAULT_DELAY: f64 = 1.0;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Main configuration structure for Docmark
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub markdown: ConvertOptions,
}

impl Config {
    /// Creates a configuration with defaults for the given start URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            crawl: CrawlConfig {
                url: url.into(),
                delay: DEFAULT_DELAY,
                max_pages: 0,
                timeout: DEFAULT_TIMEOUT,
                single_file: false,
                frontmatter: false,
                user_agent: None,
            },
            storage: StorageConfig::default(),
            markdown: ConvertOptions::default(),
        }
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Start URL (or sitemap URL)
    pub url: String,

    /// Delay between requests in seconds
    #[serde(default = "default_delay")]
    pub delay: f64,

    /// Maximum number of pages to crawl (0 = unlimited)
    #[serde(rename = "max-pages", default)]
    pub max_pages: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Combine all pages into a single Markdown file
    #[serde(rename = "single-file", default)]
    pub single_file: bool,

    /// Prepend a YAML frontmatter block to each page
    #[serde(default)]
    pub frontmatter: bool,

    /// Override for the User-Agent header
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

fn default_delay() -> f64 {
    DEFAULT_DELAY
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}
