//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

/// How often and how patiently to retry a failing call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. `1` disables retrying.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }
}

/// Errors that know whether repeating the call could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up. The last error is returned.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    let mut delay = policy.initial_delay;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && error.is_retryable() => {
                debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying");
                sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct FlakyError(&'static str);

    impl std::fmt::Display for FlakyError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Retryable for FlakyError {
        fn is_retryable(&self) -> bool {
            self.0 == "transient"
        }
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts).with_initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FlakyError("transient"))
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(FlakyError("permanent"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(FlakyError("transient"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.next_delay(Duration::from_secs(4)),
            Duration::from_secs(5)
        );
    }
}
