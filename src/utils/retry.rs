//! Retry utilities for resilient operations
//!
//! A bounded, fixed-delay retry loop. The delay is applied between attempts only,
//! so `n` failed attempts sleep `n - 1` times.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, first try included
    pub max_attempts: u32,

    /// Fixed delay between attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Execute an operation with fixed-delay retry
///
/// Returns `Ok(T)` on the first success, or the last error once every attempt failed.
/// A `max_attempts` of zero is treated as one.
///
/// # Example
///
/// ```no_run
/// use bilicomments::utils::retry::{with_retry, RetryConfig};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let config = RetryConfig::new(3, Duration::from_secs(2));
///     let result: Result<u32, String> = with_retry(&config, || async { Ok(42) }).await;
///     assert_eq!(result.unwrap(), 42);
/// }
/// ```
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_retry_if(config, operation, |_| true).await
}

/// Execute an operation with fixed-delay retry, using a custom retry predicate
///
/// Errors for which `should_retry` returns false are returned immediately.
pub async fn with_retry_if<T, E, F, Fut, P>(
    config: &RetryConfig,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    E: Display,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) => {
                if !should_retry(&e) {
                    warn!(error = %e, "Non-retryable error encountered");
                    return Err(e);
                }

                warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "Attempt failed"
                );

                if attempt >= max_attempts {
                    return Err(e);
                }
            }
        }

        debug!(
            attempt,
            delay_ms = config.delay.as_millis() as u64,
            "Retrying operation after delay"
        );
        tokio::time::sleep(config.delay).await;
        attempt += 1;
    }
}
