//! Retries for opening a model stream.
//!
//! Only the request phase is retried: once fragments have been delivered a
//! failure ends the turn, since a replay would repeat visible text.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::BugwatchError;

/// Exponential backoff over retryable errors ([`BugwatchError::is_retryable`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; `0` behaves like `1`.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    /// A single attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Wait before attempt `retry + 1`: doubling backoff, raised to a
    /// rate-limit hint when the server sent one, capped at `max_backoff`.
    pub fn delay(&self, retry: u32, err: &BugwatchError) -> Duration {
        let backoff = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(retry));
        let hinted = match err {
            BugwatchError::RateLimited {
                retry_after_ms: Some(ms),
            } => Duration::from_millis(*ms),
            _ => Duration::ZERO,
        };
        backoff.max(hinted).min(self.max_backoff)
    }

    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, BugwatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BugwatchError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry + 1 < attempts => {
                    let delay = self.delay(retry, &err);
                    warn!(
                        attempt = retry + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "model request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn delay_doubles_and_respects_hint_and_cap() {
        let policy = RetryPolicy::default();
        let net = BugwatchError::Stream("reset".into());
        assert_eq!(policy.delay(0, &net), Duration::from_millis(500));
        assert_eq!(policy.delay(2, &net), Duration::from_secs(2));
        assert_eq!(policy.delay(40, &net), Duration::from_secs(20));

        let limited = BugwatchError::RateLimited {
            retry_after_ms: Some(3_000),
        };
        assert_eq!(policy.delay(0, &limited), Duration::from_secs(3));
        let huge = BugwatchError::RateLimited {
            retry_after_ms: Some(u64::MAX),
        };
        assert_eq!(policy.delay(0, &huge), Duration::from_secs(20));
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = fast(3)
            .run(|| async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BugwatchError::api(503, "busy"))
                } else {
                    Ok("up")
                }
            })
            .await
            .unwrap();
        assert_eq!(value, "up");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(2)
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BugwatchError::RateLimited {
                    retry_after_ms: None,
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BugwatchError::RateLimited { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast(5)
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BugwatchError::Authentication("bad key".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BugwatchError::Authentication(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _ = RetryPolicy::none()
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(BugwatchError::api(500, "boom"))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
