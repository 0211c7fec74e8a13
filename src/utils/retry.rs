// Retry logic for store connection attempts
// Author: kelexine (https://github.com/kelexine)

use crate::error::{AnalyticsError, Result};
use backoff::{backoff::Backoff, ExponentialBackoff};
use std::time::Duration;
use tracing::{debug, warn};

/// Create exponential backoff configuration for retries
pub fn create_backoff(initial: Duration) -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: initial,
        initial_interval: initial,
        randomization_factor: 0.3,                       // Add jitter
        multiplier: 2.0,                                 // Double each time
        max_interval: Duration::from_secs(5),            // Cap at 5s
        max_elapsed_time: Some(Duration::from_secs(30)), // Give up after 30s
        ..Default::default()
    }
}

/// Only transport failures are worth another attempt. Bad configuration or
/// bad data will fail the same way every time.
pub fn is_retryable(err: &AnalyticsError) -> bool {
    err.is_connection()
}

/// Execute operation, retrying retryable failures up to `max_retries` extra
/// times with exponential backoff.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    max_retries: u32,
    mut backoff: ExponentialBackoff,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) || attempt > max_retries {
                    return Err(err);
                }

                let Some(delay) = backoff.next_backoff() else {
                    return Err(err);
                };
                warn!(
                    "{} failed (attempt {}): {}, retrying after {}ms",
                    operation_name,
                    attempt,
                    err,
                    delay.as_millis()
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&AnalyticsError::Connection("refused".into())));
        assert!(!is_retryable(&AnalyticsError::Config("bad ttl".into())));
        assert!(!is_retryable(&AnalyticsError::MissingColumn("ARR_DELAY".into())));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry("connect", 3, create_backoff(Duration::from_millis(1)), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AnalyticsError::Connection("refused".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("connect", 2, create_backoff(Duration::from_millis(1)), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AnalyticsError::Connection("refused".into())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry("connect", 5, create_backoff(Duration::from_millis(1)), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AnalyticsError::Config("bad port".into())) }
        })
        .await;

        assert!(matches!(result, Err(AnalyticsError::Config(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
