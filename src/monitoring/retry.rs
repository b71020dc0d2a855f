//! Retry of transient transport failures with exponential backoff

use backoff::{future::retry, ExponentialBackoff};
use std::future::Future;
use std::time::Duration;

use crate::utils::AppError;

/// Backoff parameters for notifier delivery
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// `None` retries forever; zero disables retry
    pub max_elapsed_time: Option<Duration>,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed_time: Some(Duration::from_secs(30)),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry
    pub fn none() -> Self {
        Self {
            max_elapsed_time: Some(Duration::ZERO),
            ..Self::default()
        }
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed_time = Some(max_elapsed);
        self
    }

    fn is_disabled(&self) -> bool {
        self.max_elapsed_time == Some(Duration::ZERO)
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: self.max_elapsed_time,
            multiplier: self.multiplier,
            ..Default::default()
        }
    }
}

/// 재시도 가능한 에러인지 판단
///
/// Connection errors and timeouts (no HTTP status), 429 and 5xx are transient.
/// Any other status and every non-transport error fail immediately.
pub fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::TransportFailure { status: None, .. } => true,
        AppError::TransportFailure {
            status: Some(code), ..
        } => *code == 429 || (500..=599).contains(code),
        _ => false,
    }
}

/// 재시도 로직을 적용한 비동기 작업 실행
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    if policy.is_disabled() {
        return operation().await;
    }

    let operation = &operation;
    retry(policy.backoff(), move || async move {
        match operation().await {
            Ok(result) => Ok(result),
            Err(e) => {
                if is_retryable_error(&e) {
                    tracing::warn!(error = %e, "Retryable error, will retry...");
                    Err(backoff::Error::transient(e))
                } else {
                    tracing::error!(error = %e, "Permanent error, not retrying");
                    Err(backoff::Error::permanent(e))
                }
            }
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            max_elapsed_time: Some(Duration::from_secs(2)),
            multiplier: 2.0,
        }
    }

    #[test]
    fn is_retryable_error_should_return_true_for_connection_failure() {
        assert!(is_retryable_error(&AppError::transport(None, "connection refused")));
    }

    #[test]
    fn is_retryable_error_should_return_true_for_429_and_5xx() {
        assert!(is_retryable_error(&AppError::transport(Some(429), "too many")));
        assert!(is_retryable_error(&AppError::transport(Some(500), "server")));
        assert!(is_retryable_error(&AppError::transport(Some(503), "unavailable")));
    }

    #[test]
    fn is_retryable_error_should_return_false_for_client_errors() {
        assert!(!is_retryable_error(&AppError::transport(Some(400), "bad request")));
        assert!(!is_retryable_error(&AppError::transport(Some(401), "unauthorized")));
        assert!(!is_retryable_error(&AppError::transport(Some(404), "not found")));
    }

    #[test]
    fn is_retryable_error_should_return_false_for_other_errors() {
        assert!(!is_retryable_error(&AppError::internal_error("boom")));
        assert!(!is_retryable_error(&AppError::serialization("bad json")));
    }

    #[tokio::test]
    async fn with_retry_should_succeed_after_transient_failures() {
        // Arrange
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        // Act
        let result = with_retry(&fast_policy(), || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::transport(Some(502), "bad gateway"))
                } else {
                    Ok("sent")
                }
            }
        })
        .await;

        // Assert
        assert_eq!(result.unwrap(), "sent");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_should_stop_on_permanent_error() {
        // Arrange
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        // Act
        let result: Result<(), AppError> = with_retry(&fast_policy(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::transport(Some(403), "forbidden"))
            }
        })
        .await;

        // Assert
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn with_retry_should_make_single_attempt_when_disabled() {
        // Arrange
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();

        // Act
        let result: Result<(), AppError> = with_retry(&RetryPolicy::none(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::transport(None, "timeout"))
            }
        })
        .await;

        // Assert
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
