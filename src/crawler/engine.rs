//! The crawl engine
//!
//! Owns the frontier, visited set, and statistics, and drives the
//! fetch→convert→persist→enqueue loop. Individual page failures are counted
//! and reported through the error callback but never abort the crawl; only
//! construction-time validation fails hard.

use super::fetcher::{FetchedPage, RetryableFetcher};
use super::frontier::Frontier;
use super::stats::CrawlStats;
use crate::config::{validate, Config};
use crate::markdown::MarkdownConverter;
use crate::ratelimit::RateLimiter;
use crate::robots::RobotsPolicy;
use crate::sitemap::SitemapResolver;
use crate::storage::{create_storage, Storage};
use crate::url::{extract_domain, is_in_scope, url_to_filepath};
use crate::{DocmarkError, Result};
use chrono::Local;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Progress statistics are logged every this many successful pages
pub const STATS_LOG_INTERVAL: u64 = 10;

/// Output file used in single-file mode
pub const SINGLE_FILE_NAME: &str = "documentation.md";

/// Browser-like default User-Agent; many documentation hosts serve reduced
/// pages to obvious bots.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                  (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

type PageCallback = Box<dyn Fn(&str, u64) + Send>;
type ErrorCallback = Box<dyn Fn(&str, &DocmarkError) + Send>;

/// Breadth-first documentation crawler
pub struct CrawlEngine {
    config: Config,
    base_domain: String,
    base_path: String,
    user_agent: String,
    client: Client,
    frontier: Frontier,
    stats: CrawlStats,
    storage: Box<dyn Storage>,
    converter: MarkdownConverter,
    fetcher: RetryableFetcher,
    robots: RobotsPolicy,
    limiter: RateLimiter,
    cancel: Arc<AtomicBool>,
    on_page_crawled: Option<PageCallback>,
    on_error: Option<ErrorCallback>,
}

impl CrawlEngine {
    /// Creates an engine for the given configuration
    ///
    /// Validates the configuration and seed URL; an unusable configuration
    /// fails here rather than mid-crawl.
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;

        let parsed = Url::parse(&config.crawl.url)
            .map_err(|_| DocmarkError::InvalidUrl(config.crawl.url.clone()))?;
        let base_domain = extract_domain(parsed.as_str())
            .ok_or_else(|| DocmarkError::InvalidUrl(config.crawl.url.clone()))?;
        let base_path = parsed.path().to_string();

        let user_agent = config
            .crawl
            .user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let client = build_http_client(&user_agent, config.crawl.timeout)?;
        let storage = create_storage(&config.storage)?;

        // The converter mirrors the crawl-level toggles and resolves links
        // against the seed unless the config overrides the base.
        let mut options = config.markdown.clone();
        options.single_file = config.crawl.single_file;
        options.include_frontmatter = options.include_frontmatter || config.crawl.frontmatter;

        let mut frontier = Frontier::new();
        frontier.enqueue(&config.crawl.url);

        tracing::info!(
            "Crawler initialized: start URL {}, base domain {}, base path {}",
            config.crawl.url,
            base_domain,
            base_path
        );
        if config.crawl.single_file {
            tracing::info!("Single file mode enabled: all output goes to {}", SINGLE_FILE_NAME);
        }

        Ok(Self {
            fetcher: RetryableFetcher::new(client.clone()),
            robots: RobotsPolicy::new(client.clone()),
            limiter: RateLimiter::new(Duration::from_secs_f64(config.crawl.delay)),
            converter: MarkdownConverter::new(options),
            base_domain,
            base_path,
            user_agent,
            client,
            frontier,
            stats: CrawlStats::new(),
            storage,
            cancel: Arc::new(AtomicBool::new(false)),
            on_page_crawled: None,
            on_error: None,
            config,
        })
    }

    /// Shared flag that stops the crawl between iterations when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Registers a callback invoked after each successfully persisted page
    pub fn on_page_crawled(&mut self, callback: impl Fn(&str, u64) + Send + 'static) {
        self.on_page_crawled = Some(Box::new(callback));
    }

    /// Registers a callback invoked on each page failure
    pub fn on_error(&mut self, callback: impl Fn(&str, &DocmarkError) + Send + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Runs the crawl to completion
    ///
    /// Stops when the frontier empties, the page cap is reached, or the
    /// cancel flag is set. Final statistics are logged on every exit path.
    pub async fn crawl(&mut self) -> Result<CrawlStats> {
        tracing::info!("Starting crawl from {}", self.config.crawl.url);

        if SitemapResolver::looks_like_sitemap(&self.config.crawl.url) {
            tracing::info!("Seed URL looks like a sitemap, resolving page URLs");
            let resolver = SitemapResolver::new(self.client.clone());
            let urls = resolver.resolve(&self.config.crawl.url).await;
            if urls.is_empty() {
                tracing::warn!("No URLs found in sitemap");
            } else {
                tracing::info!("Found {} URLs in sitemap", urls.len());
            }
            for url in urls {
                self.frontier.enqueue(&url);
            }
        }

        if self.config.crawl.single_file {
            let header = format!(
                "# Documentation Crawl\nStarted: {}\nRoot: {}\n\n",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                self.config.crawl.url
            );
            if let Err(e) = self.storage.save(SINGLE_FILE_NAME, &header) {
                tracing::warn!("Could not initialize single file: {}", e);
            }
        }

        while !self.frontier.is_empty() {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!("Crawl cancelled by operator");
                break;
            }

            let max_pages = self.config.crawl.max_pages;
            if max_pages > 0 && self.stats.pages_processed >= max_pages {
                tracing::info!("Reached maximum number of pages: {}", max_pages);
                break;
            }

            let current = match self.frontier.dequeue() {
                Some(url) => url,
                None => break,
            };

            // Sitemap seeding can enqueue a URL more than once before dedup
            if self.frontier.is_visited(&current) {
                continue;
            }

            if !self.robots.can_fetch(&current, &self.user_agent).await {
                tracing::debug!("Skipping {} - disallowed by robots.txt", current);
                continue;
            }

            self.limiter.wait_if_needed(&self.base_domain).await;

            let crawl_delay = self.robots.crawl_delay(&current, &self.user_agent).await;
            let effective_delay = crawl_delay
                .map(|d| d.max(self.config.crawl.delay))
                .unwrap_or(self.config.crawl.delay);

            tracing::info!("Crawling: {}", current);
            self.frontier.mark_visited(&current);

            match self.fetcher.fetch(&current).await {
                Ok(page) if page.status == 200 => {
                    if let Some(links) = self.process_page(&current, &page) {
                        for link in links {
                            self.frontier.enqueue(&link);
                        }
                    }
                    if self.stats.pages_processed > 0
                        && self.stats.pages_processed % STATS_LOG_INTERVAL == 0
                    {
                        self.log_stats(false);
                    }
                }
                Ok(page) => {
                    self.stats.pages_failed += 1;
                    tracing::warn!("Failed to retrieve {}, status code: {}", current, page.status);
                    let error = DocmarkError::HttpStatus {
                        url: current.clone(),
                        status: page.status,
                    };
                    self.call_error_callback(&current, &error);
                }
                Err(e) => {
                    self.stats.pages_failed += 1;
                    tracing::error!("Request error for {}: {}", current, e);
                    self.call_error_callback(&current, &e);
                }
            }

            // Politeness sleep after every page, including failures
            tokio::time::sleep(Duration::from_secs_f64(effective_delay)).await;
        }

        self.log_stats(true);
        Ok(self.stats.clone())
    }

    /// Converts and persists one fetched page, returning its outbound links
    ///
    /// Returns None when the page was skipped or failed; the caller enqueues
    /// nothing in that case.
    fn process_page(&mut self, url: &str, page: &FetchedPage) -> Option<Vec<String>> {
        self.stats.bytes_downloaded += page.bytes;

        if !page.content_type.contains("text/html") {
            tracing::warn!(
                "Skipping non-HTML content: {} (Content-Type: {})",
                url,
                page.content_type
            );
            return None;
        }

        let markdown = self.converter.extract_text(&page.body, url);

        if self.config.crawl.single_file {
            let section = format!("\n\n---\n\n# Source: {}\n\n{}", url, markdown);
            if let Err(e) = self.storage.append(SINGLE_FILE_NAME, &section) {
                tracing::error!("Failed to append to single file: {}", e);
                // Degrade to an individual file so the page is not lost
                if let Err(e) = self.storage.save(&url_to_filepath(url, &self.base_path), &markdown)
                {
                    self.stats.pages_failed += 1;
                    let error = DocmarkError::Storage(e);
                    self.call_error_callback(url, &error);
                    return None;
                }
            }
        } else if let Err(e) = self
            .storage
            .save(&url_to_filepath(url, &self.base_path), &markdown)
        {
            tracing::error!("Failed to save {}: {}", url, e);
            self.stats.pages_failed += 1;
            let error = DocmarkError::Storage(e);
            self.call_error_callback(url, &error);
            return None;
        }

        self.stats.pages_processed += 1;
        tracing::debug!("Processed: {} ({} characters)", url, markdown.len());
        self.call_page_callback(url, self.stats.pages_processed);

        let frontier = &self.frontier;
        let base_domain = self.base_domain.as_str();
        let base_path = self.base_path.as_str();
        let links = self.converter.extract_links(&page.body, url, |candidate| {
            is_in_scope(candidate, base_domain, base_path) && !frontier.is_visited(candidate)
        });
        tracing::debug!("Found {} links on {}", links.len(), url);

        Some(links)
    }

    fn call_page_callback(&self, url: &str, count: u64) {
        if let Some(callback) = &self.on_page_crawled {
            if catch_unwind(AssertUnwindSafe(|| callback(url, count))).is_err() {
                tracing::warn!("Page-crawled callback panicked for {}", url);
            }
        }
    }

    fn call_error_callback(&self, url: &str, error: &DocmarkError) {
        if let Some(callback) = &self.on_error {
            if catch_unwind(AssertUnwindSafe(|| callback(url, error))).is_err() {
                tracing::warn!("Error callback panicked for {}", url);
            }
        }
    }

    fn log_stats(&self, final_stats: bool) {
        if final_stats {
            tracing::info!("=== Crawling completed ===");
        }
        tracing::info!(
            "Stats: Processed {} pages ({:.1} pages/min), Failed: {}, Downloaded: {:.2} MB, Elapsed: {:.1} minutes",
            self.stats.pages_processed,
            self.stats.pages_per_minute(),
            self.stats.pages_failed,
            self.stats.megabytes_downloaded(),
            self.stats.elapsed().as_secs_f64() / 60.0
        );
        if !final_stats && self.frontier.remaining() > 0 {
            tracing::info!("Remaining URLs to visit: {}", self.frontier.remaining());
        }
        if final_stats {
            tracing::info!("Total URLs visited: {}", self.frontier.visited_count());
        }
    }
}

/// Builds the shared HTTP client with browser-like headers
fn build_http_client(user_agent: &str, timeout: u64) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}
