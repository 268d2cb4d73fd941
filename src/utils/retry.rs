//! Retry with exponential backoff
//!
//! Wraps a single flaky call (typically an outbound provider request)
//! with bounded retries. Delay doubles on each failed attempt; after
//! the last attempt the final error is propagated unchanged.

use std::time::Duration;
use tracing::{debug, error};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,
    /// Base delay; attempt `n` waits `base_delay * 2^n`
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Retry mechanism with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a policy from attempt count and base delay
    pub fn with_attempts(max_attempts: u32, base_delay: Duration) -> Self {
        Self::new(RetryConfig {
            max_attempts: max_attempts.max(1),
            base_delay,
        })
    }

    /// Execute a function with retry logic
    ///
    /// Backoff is pure exponential with no jitter and no delay cap.
    pub async fn call<F, Fut, R, E>(&self, mut f: F) -> std::result::Result<R, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<R, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0u32;

        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("Retry succeeded on attempt {}", attempt + 1);
                    }
                    return Ok(result);
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.config.max_attempts {
                        error!("Giving up after {} attempts: {}", attempt, err);
                        return Err(err);
                    }

                    let delay = self.config.base_delay * 2u32.pow(attempt - 1);
                    debug!(
                        "Attempt {} failed: {}, retrying in {:?}",
                        attempt, err, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_eventually_succeeds() {
        let policy = RetryPolicy::with_attempts(3, Duration::from_millis(1));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = policy
            .call(|| {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("not yet")
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_propagates_last_error() {
        let policy = RetryPolicy::with_attempts(2, Duration::from_millis(1));
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result: std::result::Result<(), String> = policy
            .call(|| {
                let c = c.clone();
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {}", n))
                }
            })
            .await;

        assert_eq!(result, Err("failure 1".to_string()));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backoff_is_exponential() {
        let policy = RetryPolicy::with_attempts(4, Duration::from_millis(100));
        let start = tokio::time::Instant::now();

        let result: std::result::Result<(), &str> = policy.call(|| async { Err("down") }).await;
        assert!(result.is_err());

        // 100 + 200 + 400 ms of backoff across three sleeps
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_sleep() {
        let policy = RetryPolicy::with_attempts(1, Duration::from_secs(60));
        let result: std::result::Result<(), &str> = policy.call(|| async { Err("down") }).await;
        assert!(result.is_err());
    }
}
