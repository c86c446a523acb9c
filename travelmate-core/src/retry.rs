//! Bounded retry for outbound calls.
//!
//! Every external request (Reddit, maps, language model) goes through
//! [`RetryExecutor::execute`]. Only transient failures are retried, with a
//! linear backoff; once the attempts are used up the failure surfaces as
//! [`CoreError::ServiceUnavailable`].

use crate::{CoreError, ErrorExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay unit for linear backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Upper bound on a single delay (in milliseconds)
    pub max_delay_ms: u64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            jitter_factor: 0.1,
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with linear backoff
    Retry,
    /// Retry after a delay the server asked for
    RetryWithDelay(Duration),
    /// Don't retry (for permanent failures)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    if !error.is_retryable() {
        return RetryStrategy::NoRetry;
    }
    match error.retry_after() {
        Some(delay) => RetryStrategy::RetryWithDelay(delay),
        None => RetryStrategy::Retry,
    }
}

/// Linear backoff: `base * (attempt + 1)` plus jitter, capped at `max_delay_ms`.
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let linear_ms = config
        .base_delay_ms
        .saturating_mul(u64::from(attempt) + 1)
        .min(config.max_delay_ms);

    let jitter_range = (linear_ms as f64 * config.jitter_factor.clamp(0.0, 1.0)) as u64;
    let jitter = fastrand::u64(0..=jitter_range);

    Duration::from_millis(linear_ms.saturating_add(jitter).min(config.max_delay_ms))
}

/// Retry executor that wraps operations with retry logic
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation against `service`, retrying transient failures.
    pub async fn execute<F, Fut, T>(
        &self,
        service: &str,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation_name);
            }

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            "Operation {} succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            attempt += 1;
            let delay = match get_retry_strategy(&error) {
                RetryStrategy::NoRetry => {
                    debug!(
                        "Not retrying {} due to error type: {}",
                        operation_name, error
                    );
                    return Err(error);
                }
                RetryStrategy::Retry => calculate_delay(attempt - 1, &self.config),
                RetryStrategy::RetryWithDelay(delay) => {
                    delay.min(Duration::from_millis(self.config.max_delay_ms))
                }
            };

            if attempt >= max_attempts {
                warn!(
                    service,
                    attempts = attempt,
                    "Operation {} failed on every attempt: {}",
                    operation_name,
                    error
                );
                return Err(CoreError::ServiceUnavailable {
                    service: service.to_string(),
                    attempts: attempt,
                    reason: error.to_string(),
                });
            }

            info!(
                "Retrying {} in {:?} due to: {}",
                operation_name, delay, error
            );
            sleep(delay).await;
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
