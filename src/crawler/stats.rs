//! Crawl progress counters

use std::time::{Duration, Instant};

/// Counters mutated only by the crawl engine
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// Pages fetched, converted, and persisted
    pub pages_processed: u64,

    /// Pages whose fetch, conversion, or persistence failed
    pub pages_failed: u64,

    /// Raw response bytes received, counted even for skipped pages
    pub bytes_downloaded: u64,

    started_at: Instant,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            pages_processed: 0,
            pages_failed: 0,
            bytes_downloaded: 0,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn pages_per_minute(&self) -> f64 {
        let minutes = self.elapsed().as_secs_f64() / 60.0;
        if minutes > 0.0 {
            self.pages_processed as f64 / minutes
        } else {
            0.0
        }
    }

    pub fn megabytes_downloaded(&self) -> f64 {
        self.bytes_downloaded as f64 / (1024.0 * 1024.0)
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zeroed() {
        let stats = CrawlStats::new();
        assert_eq!(stats.pages_processed, 0);
        assert_eq!(stats.pages_failed, 0);
        assert_eq!(stats.bytes_downloaded, 0);
    }

    #[test]
    fn test_megabytes() {
        let mut stats = CrawlStats::new();
        stats.bytes_downloaded = 5 * 1024 * 1024;
        assert!((stats.megabytes_downloaded() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pages_per_minute_nonnegative() {
        let mut stats = CrawlStats::new();
        stats.pages_processed = 10;
        assert!(stats.pages_per_minute() >= 0.0);
    }
}
