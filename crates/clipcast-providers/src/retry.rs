//! Bounded exponential backoff for provider calls.
//!
//! Transient provider failures (rate limits, 5xx, timeouts) get retried;
//! anything classified permanent returns straight away.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Backoff settings for a retried provider call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry budget on top of the first attempt.
    pub max_retries: u32,
    /// First backoff delay; each subsequent one doubles.
    pub base_delay: Duration,
    /// Ceiling on any single backoff delay.
    pub max_delay: Duration,
    /// Name carried into retry log lines.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Default backoff settings under the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Doubling delay for the nth retry, capped at `max_delay`.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

/// Execute a provider call with bounded backoff.
///
/// Only errors classified as retryable (`ProviderError::is_retryable`) consume
/// retry budget; validation/permanent/not-found errors return on the first
/// occurrence.
pub async fn retry_provider<F, Fut, T>(config: &RetryConfig, operation: F) -> ProviderResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    operation = config.operation_name.as_str(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Provider call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
