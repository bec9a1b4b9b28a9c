//! Per-domain rate limiting
//!
//! Enforces a minimum delay between consecutive requests to the same key
//! (usually a domain). The first request for a key never waits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Enforces a minimum inter-request delay per key
///
/// State is mutex-guarded so a parallelized crawl keeps per-key mutual
/// exclusion; the lock is never held across a sleep.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given minimum delay between requests
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until at least the configured delay has elapsed since the last
    /// call with the same key, then records the request time
    pub async fn wait_if_needed(&self, key: &str) {
        let wait = self.time_until_ready(key);

        if !wait.is_zero() {
            tracing::debug!("Rate limiting {}: waiting {:.2}s", key, wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }

        let mut last = self.last_request.lock().unwrap();
        last.insert(key.to_string(), Instant::now());
    }

    /// Returns how long the caller would wait for this key right now
    pub fn time_until_ready(&self, key: &str) -> Duration {
        let last = self.last_request.lock().unwrap();
        match last.get(key) {
            Some(at) => {
                let elapsed = at.elapsed();
                self.delay.saturating_sub(elapsed)
            }
            None => Duration::ZERO,
        }
    }
}
