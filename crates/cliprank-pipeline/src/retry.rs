//! Retry utilities with exponential backoff.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retry attempts (not counting the initial attempt).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied per further retry.
    pub multiplier: u32,
    /// Operation name for logging.
    pub operation_name: String,
}

impl RetryConfig {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
            operation_name: operation_name.into(),
        }
    }

    /// The ingest schedule: three retries at 1s, 4s and 16s.
    pub fn ingest(operation_name: impl Into<String>) -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 4,
            operation_name: operation_name.into(),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(self.multiplier.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run an async operation with retries.
///
/// `is_retryable` gates each retry so permanent refusals fail fast.
pub async fn retry_async<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && is_retryable(&e) => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    operation = %config.operation_name,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "Attempt failed, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_ingest_schedule() {
        let config = RetryConfig::ingest("fetch");
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(16));
    }

    #[tokio::test]
    async fn test_eventual_success() {
        let config = RetryConfig {
            base_delay: Duration::from_millis(1),
            ..RetryConfig::new("test")
        };
        let calls = AtomicU32::new(0);

        let result = retry_async(
            &config,
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let config = RetryConfig {
            base_delay: Duration::from_millis(1),
            ..RetryConfig::new("test")
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = retry_async(
            &config,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("permanent") }
            },
            |_| false,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let config = RetryConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            ..RetryConfig::new("test")
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), &str> = retry_async(
            &config,
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("always") }
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
