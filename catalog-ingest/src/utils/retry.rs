//! Fetch Retry Logic
//!
//! Exponential backoff with jitter for transient remote failures.
//!
//! **Backoff Strategy:**
//! - Wait before retry `n` (0-based): `base_delay * 2^n`
//! - Plus uniform jitter in `[0, max_jitter)`
//! - Optional bound on the number of retries; without one the loop keeps
//!   going until the operation succeeds or fails with a fatal error

use crate::error::FetchError;
use catalog_common::config::RetryConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Backoff parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_jitter: Duration,
    /// Maximum retries after the first attempt, `None` for unbounded
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_jitter: config.max_jitter(),
            max_attempts: config.max_attempts(),
        }
    }

    /// Deterministic part of the wait before retry `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Full wait before retry `attempt`, jitter included
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff(attempt).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_nanos = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        if max_nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(0..max_nanos))
    }
}

/// Run `operation` until it succeeds, fails fatally, or retries run out.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "manifest fetch")
/// * `policy` - Backoff parameters
/// * `operation` - Async closure performing one attempt
///
/// # Returns
/// The first successful result; the first non-retryable error; or
/// `FetchError::RetriesExhausted` wrapping the last retryable error.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        retries = attempt,
                        "Request succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if let Some(max) = policy.max_attempts {
                    if attempt >= max {
                        tracing::error!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            error = %err,
                            "Retries exhausted"
                        );
                        return Err(FetchError::RetriesExhausted {
                            operation: operation_name.to_string(),
                            attempts: attempt + 1,
                            last_error: Box::new(err),
                        });
                    }
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Making new request..."
                );

                tokio::time::sleep(delay).await;
                attempt = attempt.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn connect_error() -> FetchError {
        FetchError::Connect {
            url: "http://localhost/files_list.data".to_string(),
            reason: "connection refused".to_string(),
        }
    }

    fn policy(max_attempts: Option<u32>) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_millis(10),
            max_attempts,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = policy(None);
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(4), Duration::from_secs(16));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = policy(None);
        assert_eq!(policy.backoff(200), Duration::from_secs(1).saturating_mul(u32::MAX));
    }

    #[test]
    fn test_delay_jitter_bounds() {
        let policy = policy(None);
        for attempt in 0..6 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= policy.backoff(attempt));
            assert!(delay < policy.backoff(attempt) + Duration::from_millis(10));
        }
    }

    #[test]
    fn test_zero_jitter() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(5),
            max_jitter: Duration::ZERO,
            max_attempts: None,
        };
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let result = retry_with_backoff("test_op", &policy(Some(3)), || async {
            Ok::<i32, FetchError>(42)
        })
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_grow_until_success() {
        let calls = Mutex::new(Vec::new());
        let calls_ref = &calls;

        let result = retry_with_backoff("manifest fetch", &policy(None), || async move {
            let mut calls = calls_ref.lock().unwrap();
            calls.push(Instant::now());
            if calls.len() < 5 {
                Err(connect_error())
            } else {
                Ok(vec!["a.json".to_string()])
            }
        })
        .await;

        assert_eq!(result.unwrap(), vec!["a.json".to_string()]);

        let calls = calls.into_inner().unwrap();
        assert_eq!(calls.len(), 5);
        let waits: Vec<Duration> = calls.windows(2).map(|w| w[1] - w[0]).collect();
        for (attempt, wait) in waits.iter().enumerate() {
            assert!(*wait >= Duration::from_secs(1 << attempt));
        }
        for pair in waits.windows(2) {
            assert!(pair[1] > pair[0], "waits not strictly increasing: {:?}", waits);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausted() {
        let calls = Mutex::new(0u32);
        let calls_ref = &calls;

        let result = retry_with_backoff("payload fetch", &policy(Some(2)), || async move {
            *calls_ref.lock().unwrap() += 1;
            Err::<(), _>(connect_error())
        })
        .await;

        match result {
            Err(FetchError::RetriesExhausted {
                operation,
                attempts,
                last_error,
            }) => {
                assert_eq!(operation, "payload fetch");
                assert_eq!(attempts, 3);
                assert!(matches!(*last_error, FetchError::Connect { .. }));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(calls.into_inner().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_fatal_error_not_retried() {
        let calls = Mutex::new(0u32);
        let calls_ref = &calls;

        let result = retry_with_backoff("payload fetch", &policy(None), || async move {
            *calls_ref.lock().unwrap() += 1;
            Err::<(), _>(FetchError::Status {
                status: 404,
                url: "http://localhost/missing.json".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
        assert_eq!(calls.into_inner().unwrap(), 1);
    }
}
