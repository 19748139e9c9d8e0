//! Core HTTP operations with rate limiting and retry logic
//!
//! This module provides the fundamental HTTP request operations with
//! built-in resilience patterns: client-side rate limiting and a bounded
//! exponential backoff for transient failures.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::constants::limits;
use crate::errors::{ConfigError, ConfigResult, FetchError, FetchResult};

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    max_retries: u32,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client, rate limit and retry budget
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the rate limit is zero
    pub fn new(client: Client, rate_limit_rps: u32, max_retries: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries,
        })
    }

    /// Builds the rate limiter with the specified rate limit
    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ConfigResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "client.rate_limit_rps".to_string(),
                value: rate_limit_rps.to_string(),
                reason: "Rate limit must be non-zero".to_string(),
            }
        })?);
        Ok(RateLimiter::direct(quota))
    }

    /// Delay before retry number `attempt` (1-based), capped at
    /// `RETRY_MAX_DELAY_MS` plus jitter
    fn backoff_delay(attempt: u32) -> Duration {
        let base = 2_u64
            .checked_pow(attempt.saturating_sub(1))
            .and_then(|factor| limits::RETRY_BASE_DELAY_MS.checked_mul(factor))
            .map_or(limits::RETRY_MAX_DELAY_MS, |ms| ms.min(limits::RETRY_MAX_DELAY_MS));
        Duration::from_millis(base + fastrand::u64(0..=limits::RETRY_JITTER_MS))
    }

    /// Sends a request with rate limiting and bounded retries
    ///
    /// `build` is called once per attempt. Transport errors, HTTP 429 and
    /// HTTP 5xx are retried; every other response is returned to the caller
    /// for status handling. Only use this for requests that are safe to
    /// repeat.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the retry budget is exhausted
    pub async fn execute<F>(&self, build: F) -> FetchResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.send_with_retries(build, self.max_retries).await
    }

    /// Sends a request exactly once, for writes that must not be repeated
    ///
    /// A timeout or 5xx may arrive after the service applied the write, so
    /// nothing is retried: transport errors map to `FetchError::Http`, 429
    /// to `RateLimitExceeded` and 5xx to `FetchError::Status`.
    pub async fn execute_once<F>(&self, build: F) -> FetchResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.send_with_retries(build, 0).await
    }

    async fn send_with_retries<F>(&self, build: F, max_retries: u32) -> FetchResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retries = 0;
        loop {
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(20)))
                .await;

            match build(&self.client).send().await {
                Ok(response) => {
                    let status = response.status();
                    let transient =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

                    if !transient {
                        tracing::debug!("{} {}", status.as_u16(), response.url());
                        return Ok(response);
                    }

                    if retries < max_retries {
                        retries += 1;
                        let delay = Self::backoff_delay(retries);
                        tracing::warn!(
                            "Service answered {} (attempt {}/{}). Backing off for {}ms",
                            status.as_u16(),
                            retries,
                            max_retries,
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(FetchError::RateLimitExceeded);
                    }
                    let body = response.text().await.unwrap_or_default();
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) if retries < max_retries => {
                    retries += 1;
                    let delay = Self::backoff_delay(retries);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {}ms",
                        retries,
                        max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("Request failed after {} retries: {}", max_retries, e);
                    if max_retries == 0 {
                        return Err(FetchError::Http(e));
                    }
                    return Err(FetchError::MaxRetriesExceeded { max_retries });
                }
            }
        }
    }

    /// Get a reference to the underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::config::ClientConfig;

    #[tokio::test]
    async fn test_rate_limiter_creation() {
        let rate_limiter = HttpHandler::build_rate_limiter(5).unwrap();
        rate_limiter.until_ready().await;
    }

    #[test]
    fn test_rate_limiter_zero_fails() {
        let result = HttpHandler::build_rate_limiter(0);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[tokio::test]
    async fn test_http_handler_creation() {
        let config = ClientConfig::default();
        let client = config.build_http_client().unwrap();
        let handler = HttpHandler::new(client, 5, 1);
        assert!(handler.is_ok());
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let jitter = Duration::from_millis(limits::RETRY_JITTER_MS);
        let first = HttpHandler::backoff_delay(1);
        let second = HttpHandler::backoff_delay(2);

        let base = Duration::from_millis(limits::RETRY_BASE_DELAY_MS);
        assert!(first >= base && first <= base + jitter);
        assert!(second >= base * 2 && second <= base * 2 + jitter);
    }

    #[test]
    fn test_backoff_is_capped_for_large_retry_counts() {
        let cap = Duration::from_millis(limits::RETRY_MAX_DELAY_MS + limits::RETRY_JITTER_MS);
        for attempt in [20, 58, 64, 200, u32::MAX] {
            assert!(HttpHandler::backoff_delay(attempt) <= cap, "attempt {}", attempt);
        }
    }
}
