//! The crawl engine and its supporting pieces
//!
//! [`CrawlEngine`] drives a breadth-first crawl: the [`Frontier`] orders
//! pending URLs, the [`RetryableFetcher`] retrieves pages, and [`CrawlStats`]
//! tracks progress. Robots handling, rate limiting, conversion, and storage
//! live in their own modules and are wired together here.

mod engine;
mod fetcher;
mod frontier;
mod stats;

pub use engine::{CrawlEngine, SINGLE_FILE_NAME, STATS_LOG_INTERVAL};
pub use fetcher::{FetchedPage, RetryPolicy, RetryableFetcher, DEFAULT_MAX_CONTENT_LENGTH};
pub use frontier::Frontier;
pub use stats::CrawlStats;
