//! Exponential backoff around any [`BaseQuery`]

use std::time::Duration;

use async_trait::async_trait;
use reel_core::error::NormalizedError;
use reel_core::types::RequestDescriptor;
use tracing::debug;

use crate::executor::BaseQuery;
use crate::transport::RawResponse;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay following `delay`, capped at `max_delay`
    pub fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(
            Duration::from_millis((delay.as_millis() as f64 * self.multiplier) as u64),
            self.max_delay,
        )
    }
}

/// Retries network, timeout and 5xx failures of the wrapped query.
///
/// Client errors (4xx), decode failures and cancellations are returned at once.
#[derive(Debug, Clone)]
pub struct Retrying<B> {
    inner: B,
    config: RetryConfig,
}

impl<B: BaseQuery> Retrying<B> {
    pub fn new(inner: B, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

#[async_trait]
impl<B: BaseQuery> BaseQuery for Retrying<B> {
    async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse, NormalizedError> {
        let mut delay = self.config.initial_delay;
        let mut attempt = 0;

        loop {
            match self.inner.execute(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) if attempt < self.config.max_retries && error.is_transient() => {
                    attempt += 1;
                    debug!(
                        "Retrying {} {} in {:?} (attempt {}/{}): {}",
                        request.method, request.url, delay, attempt, self.config.max_retries, error
                    );
                    tokio::time::sleep(delay).await;
                    delay = self.config.next_delay(delay);
                }
                Err(error) => return Err(error),
            }
        }
    }
}
