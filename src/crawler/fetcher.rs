//! Bounded, retried HTTP fetching
//!
//! One GET with exponential backoff on transient failures and retryable
//! status codes, plus a streaming size guard. The Content-Length header is
//! checked first but never trusted: the body is accumulated chunk by chunk
//! and the fetch aborts the instant the running total passes the maximum.

use crate::{DocmarkError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;

/// Default cap on response body size (10 MiB)
pub const DEFAULT_MAX_CONTENT_LENGTH: u64 = 10 * 1024 * 1024;

/// Status codes worth retrying
const RETRYABLE_STATUS: &[u16] = &[500, 502, 503, 504, 429];

/// Exponential backoff parameters for the fetch retry loop
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry, in seconds
    pub initial_delay: f64,

    /// Multiplier applied per retry
    pub backoff_factor: f64,

    /// Upper bound on any single delay, in seconds
    pub max_delay: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: 1.0,
            backoff_factor: 2.0,
            max_delay: 60.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(delay.min(self.max_delay))
    }
}

/// A completed HTTP response with its body fully read
#[derive(Debug)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    /// Body size in bytes, counted toward crawl statistics
    pub bytes: u64,
}

enum Attempt {
    Page(FetchedPage),
    /// A retryable status, with any numeric Retry-After value
    RetryableStatus { status: u16, retry_after: Option<f64> },
}

/// Performs bounded, retried GET requests
pub struct RetryableFetcher {
    client: Client,
    policy: RetryPolicy,
    max_content_length: u64,
}

impl RetryableFetcher {
    /// Creates a fetcher with the default retry policy and size cap
    pub fn new(client: Client) -> Self {
        Self::with_policy(client, RetryPolicy::default())
    }

    pub fn with_policy(client: Client, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }

    pub fn max_content_length(mut self, max_bytes: u64) -> Self {
        self.max_content_length = max_bytes;
        self
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// Responses with a non-retryable status are returned as-is for the
    /// caller to inspect. `ContentTooLarge` is terminal and never retried.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut attempt: u32 = 0;

        loop {
            match self.attempt(url).await {
                Ok(Attempt::Page(page)) => return Ok(page),
                Ok(Attempt::RetryableStatus {
                    status,
                    retry_after,
                }) => {
                    if attempt >= self.policy.max_retries {
                        return Err(DocmarkError::FetchExhausted {
                            url: url.to_string(),
                            attempts: attempt + 1,
                            message: format!("HTTP {}", status),
                        });
                    }
                    let delay = retry_after
                        .map(|seconds| Duration::from_secs_f64(seconds.min(self.policy.max_delay)))
                        .unwrap_or_else(|| self.policy.delay_for_attempt(attempt));
                    tracing::warn!(
                        "HTTP {} from {}, retrying in {:.1}s (retry {}/{})",
                        status,
                        url,
                        delay.as_secs_f64(),
                        attempt + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => match e {
                    DocmarkError::ContentTooLarge { .. } => return Err(e),
                    DocmarkError::Http { .. } => {
                        if attempt >= self.policy.max_retries {
                            return Err(DocmarkError::FetchExhausted {
                                url: url.to_string(),
                                attempts: attempt + 1,
                                message: e.to_string(),
                            });
                        }
                        let delay = self.policy.delay_for_attempt(attempt);
                        tracing::warn!(
                            "Request to {} failed ({}), retrying in {:.1}s (retry {}/{})",
                            url,
                            e,
                            delay.as_secs_f64(),
                            attempt + 1,
                            self.policy.max_retries
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    other => return Err(other),
                },
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<Attempt> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocmarkError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status().as_u16();

        if RETRYABLE_STATUS.contains(&status) {
            // A hostile header must not poison the backoff math: only finite,
            // non-negative values are honored.
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0);
            return Ok(Attempt::RetryableStatus {
                status,
                retry_after,
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        // The declared length rejects oversized bodies early; the streaming
        // accumulation below catches absent or understated headers.
        if let Some(declared) = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
        {
            if declared > self.max_content_length {
                return Err(DocmarkError::ContentTooLarge {
                    url: url.to_string(),
                    max_bytes: self.max_content_length,
                });
            }
        }

        let body_bytes = collect_body(response.bytes_stream(), self.max_content_length)
            .await
            .map_err(|e| match e {
                BodyError::TooLarge => DocmarkError::ContentTooLarge {
                    url: url.to_string(),
                    max_bytes: self.max_content_length,
                },
                BodyError::Stream(e) => DocmarkError::Http {
                    url: url.to_string(),
                    source: e,
                },
            })?;

        let bytes = body_bytes.len() as u64;
        let body = String::from_utf8_lossy(&body_bytes).into_owned();

        Ok(Attempt::Page(FetchedPage {
            status,
            content_type,
            body,
            bytes,
        }))
    }
}

enum BodyError<E> {
    /// Running byte total passed the maximum
    TooLarge,
    Stream(E),
}

/// Accumulates a body stream, aborting the moment the total exceeds `max`
///
/// Dropping the stream on abort closes the connection, so an oversized
/// response is never read to completion.
async fn collect_body<S, B, E>(mut stream: S, max: u64) -> std::result::Result<Vec<u8>, BodyError<E>>
where
    S: futures_util::Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(BodyError::Stream)?;
        let chunk = chunk.as_ref();
        if (body.len() + chunk.len()) as u64 > max {
            return Err(BodyError::TooLarge);
        }
        body.extend_from_slice(chunk);
    }
    Ok(body)
}
