//! Bounded retry for rate-limited calls
//!
//! The server decides how long to wait (via `Retry-After`); this module
//! decides how many times we are willing to wait before giving up.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of cumulative waits (not including the initial attempt)
    pub max_retries: u32,

    /// Upper bound on a single server-requested wait
    pub max_wait: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_wait: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl RetryConfig {
    /// Never wait; the first retryable failure is returned as exhausted
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Clamp a server-requested wait to `max_wait`
    pub fn wait_for(&self, requested: Duration) -> Duration {
        requested.min(self.max_wait)
    }
}

/// Retry classification for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a specific duration (from the Retry-After header)
    RetryAfter(Duration),
    /// Don't retry, the error is terminal
    NoRetry,
}

/// Trait for errors that can indicate whether to retry
pub trait RetryableError: Sized {
    /// Determine if this error should be retried
    fn retry_decision(&self) -> RetryDecision;

    /// Convert the last retryable error once the budget is spent
    fn exhausted(self, _attempts: u32, _last_wait: Duration) -> Self {
        self
    }
}

/// Execute an async operation, waiting and retrying while it asks to.
///
/// At most `config.max_retries` waits happen; a retryable failure after that
/// is passed through [`RetryableError::exhausted`].
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + std::fmt::Display,
{
    let mut attempt = 0;
    let mut last_wait = Duration::ZERO;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => match e.retry_decision() {
                RetryDecision::NoRetry => {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        "Operation failed with non-retryable error: {}",
                        e
                    );
                    return Err(e);
                }
                RetryDecision::RetryAfter(requested) => {
                    if attempt >= config.max_retries {
                        warn!(
                            operation = operation_name,
                            waits = attempt,
                            "Retry budget exhausted: {}",
                            e
                        );
                        return Err(e.exhausted(attempt, last_wait));
                    }

                    let wait = config.wait_for(requested);
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = config.max_retries,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limited, waiting before retry: {}",
                        e
                    );

                    sleep(wait).await;
                    last_wait = wait;
                    attempt += 1;
                }
            },
        }
    }
}
