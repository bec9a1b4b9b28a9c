//! Robots.txt fetching, caching, and policy decisions
//!
//! One rule set is cached per origin (scheme+host) for [`ROBOTS_CACHE_TTL`].
//! Fetch failures fall back to allow-all so a flaky robots.txt never halts
//! an otherwise healthy crawl; a 401/403 on the robots.txt request itself is
//! also treated as allow-all and logged.

mod rules;

pub use rules::RobotsRules;

use crate::url::extract_origin;
use reqwest::Client;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a fetched robots.txt stays fresh
pub const ROBOTS_CACHE_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    rules: RobotsRules,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_stale(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() > ttl
    }
}

/// Answers allow/deny and crawl-delay queries against cached robots.txt
pub struct RobotsPolicy {
    client: Client,
    ttl: Duration,
    cache: HashMap<String, CacheEntry>,
}

impl RobotsPolicy {
    /// Creates a policy that fetches robots.txt with the given client
    ///
    /// The client carries the crawler's headers and timeout.
    pub fn new(client: Client) -> Self {
        Self::with_ttl(client, ROBOTS_CACHE_TTL)
    }

    /// Creates a policy with a custom cache TTL
    pub fn with_ttl(client: Client, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            cache: HashMap::new(),
        }
    }

    /// Checks whether `url` may be fetched for `user_agent`
    ///
    /// Defaults to allow when the URL has no parsable origin, so evaluation
    /// problems never halt the crawl.
    pub async fn can_fetch(&mut self, url: &str, user_agent: &str) -> bool {
        let origin = match extract_origin(url) {
            Some(o) => o,
            None => {
                tracing::warn!("Could not derive origin for robots check: {}", url);
                return true;
            }
        };

        let rules = self.rules_for(&origin).await;
        let allowed = rules.is_allowed(url, user_agent);
        if !allowed {
            tracing::debug!("robots.txt disallows fetching: {}", url);
        }
        allowed
    }

    /// Gets the crawl delay declared for `user_agent` at the URL's origin
    pub async fn crawl_delay(&mut self, url: &str, user_agent: &str) -> Option<f64> {
        let origin = extract_origin(url)?;
        let delay = self.rules_for(&origin).await.crawl_delay(user_agent);
        if let Some(seconds) = delay {
            tracing::debug!("robots.txt declares crawl delay of {}s for {}", seconds, origin);
        }
        delay
    }

    /// Returns the cached rules for an origin, fetching if absent or stale
    async fn rules_for(&mut self, origin: &str) -> &RobotsRules {
        let needs_fetch = match self.cache.get(origin) {
            Some(entry) => entry.is_stale(self.ttl),
            None => true,
        };

        if needs_fetch {
            let rules = self.fetch_rules(origin).await;
            self.cache.insert(
                origin.to_string(),
                CacheEntry {
                    rules,
                    fetched_at: Instant::now(),
                },
            );
        }

        &self.cache[origin].rules
    }

    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin);
        tracing::debug!("Fetching {}", robots_url);

        match self.client.get(&robots_url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.as_u16() == 401 || status.as_u16() == 403 {
                    // Deliberately permissive: access-denied on robots.txt
                    // itself does not block the crawl.
                    tracing::warn!(
                        "robots.txt at {} returned HTTP {}, treating as allow-all",
                        robots_url,
                        status.as_u16()
                    );
                    return RobotsRules::allow_all();
                }
                if !status.is_success() {
                    tracing::debug!(
                        "robots.txt at {} returned HTTP {}, treating as allow-all",
                        robots_url,
                        status.as_u16()
                    );
                    return RobotsRules::allow_all();
                }
                match response.text().await {
                    Ok(content) => RobotsRules::from_content(&content),
                    Err(e) => {
                        tracing::warn!("Could not read robots.txt from {}: {}", robots_url, e);
                        RobotsRules::allow_all()
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Could not load robots.txt from {}: {}", robots_url, e);
                RobotsRules::allow_all()
            }
        }
    }
}
