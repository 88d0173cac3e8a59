use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::errors::GenerationError;
use crate::domain::models::RetryConfig;

/// Retry policy with exponential backoff for transient generation errors
///
/// Only rate-limit (429) and server (5xx) failures are retried; transport and
/// client errors are returned immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms: max_backoff_ms.max(initial_backoff_ms),
        }
    }

    /// Execute an operation with exponential backoff retry logic
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "generation request succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    if !self.should_retry(&err, attempt) {
                        if attempt > 0 {
                            warn!(attempts = attempt + 1, error = %err, "generation request failed");
                        }
                        return Err(err);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        attempt = attempt + 1,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient generation error, retrying"
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Formula: min(initial_backoff * 2^attempt, max_backoff)
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(attempt))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    fn should_retry(&self, error: &GenerationError, attempt: u32) -> bool {
        attempt < self.max_retries && error.is_transient()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.calculate_backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.calculate_backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.calculate_backoff(2), Duration::from_millis(4000));
        assert_eq!(policy.calculate_backoff(3), Duration::from_millis(8000));
        assert_eq!(policy.calculate_backoff(4), Duration::from_millis(8000)); // capped
    }

    #[test]
    fn test_should_retry_only_transient_errors() {
        let policy = RetryPolicy::new(2, 10, 100);

        assert!(policy.should_retry(&GenerationError::RateLimitExceeded, 0));
        assert!(policy.should_retry(
            &GenerationError::ServerError {
                status: 500,
                body: String::new()
            },
            1
        ));
        assert!(!policy.should_retry(&GenerationError::RateLimitExceeded, 2));
        assert!(!policy.should_retry(&GenerationError::Network("reset".to_string()), 0));
        assert!(!policy.should_retry(
            &GenerationError::AuthenticationFailed(String::new()),
            0
        ));
    }

    #[tokio::test]
    async fn test_execute_retries_until_success() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(GenerationError::RateLimitExceeded)
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(2, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(GenerationError::ServerError {
                        status: 503,
                        body: "busy".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(
            result,
            Err(GenerationError::ServerError { status: 503, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_does_not_retry_permanent_error() {
        let policy = RetryPolicy::new(3, 1, 5);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(GenerationError::InvalidRequest("bad".to_string()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
