//! Exponential backoff retry loop
//!
//! Attempt 0 is the initial try. After a retryable failure the loop sleeps
//! `base_delay * 2^n` (n counting failures so far) before trying again, up
//! to `max_retries` additional attempts. Permanent failures surface
//! immediately.

use std::future::Future;
use std::time::Duration;

use log::warn;

use super::error::ApiError;

/// Backoff policy for retryable API failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the initial one
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each subsequent retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry `attempt` (1-indexed): `base_delay * 2^(attempt-1)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Drive `operation` until it succeeds, fails permanently, or retries
    /// are exhausted. The last error is returned to the caller.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{}: attempt {} failed ({}), retrying in {:.1}s",
                        label,
                        attempt,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32, base_secs: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_secs(base_secs),
        }
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = policy(3, 2);
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_gets_one_attempt() {
        let policy = policy(3, 1);
        let calls = AtomicU32::new(0);

        let result: Result<(), ApiError> = policy
            .run("create element", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ApiError::Http {
                        status: 404,
                        message: "not found".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(ApiError::Http { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_error_exhausts_retries() {
        let policy = policy(3, 1);
        let calls = AtomicU32::new(0);

        let result: Result<(), ApiError> = policy
            .run("create element", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ApiError::Http {
                        status: 503,
                        message: "unavailable".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(ApiError::Http { status: 503, .. })));
        // Initial attempt plus max_retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let policy = policy(3, 1);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("create element", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(ApiError::Http {
                            status: 502,
                            message: "bad gateway".to_string(),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
