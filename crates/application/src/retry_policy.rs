use std::future::Future;
use std::time::Duration;

use talentdesk_core::{AppError, AppResult};
use thiserror::Error;
use tracing::warn;

/// Bounded exponential backoff for collaborator calls that may fail
/// transiently.
///
/// Only errors reported as transient by [`AppError::is_transient`] are
/// retried; every other error ends the run after the attempt that produced
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

/// Error returned when a retried operation did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed after {attempts} attempt(s): {last_error}")]
pub struct RetryExhausted {
    /// Name of the operation, for logs and error messages.
    pub operation: String,
    /// Number of attempts made.
    pub attempts: u32,
    /// Error of the final attempt.
    pub last_error: AppError,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: Duration::from_secs(5),
        }
    }

    /// Policy that makes exactly one attempt.
    #[must_use]
    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Caps the delay between two attempts.
    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Returns the attempt limit.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay after the given failed attempt (1-based): the
    /// initial backoff doubled per previous attempt, capped at the maximum.
    #[must_use]
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.max_backoff)
    }

    /// Runs `call` until it succeeds, fails permanently, or the attempt
    /// limit is reached.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let mut attempt = 0_u32;
        loop {
            attempt = attempt.saturating_add(1);
            let error = match call().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_transient() || attempt >= self.max_attempts {
                return Err(RetryExhausted {
                    operation: operation.to_owned(),
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = self.backoff_after(attempt);
            warn!(
                operation,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "retrying after transient failure"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use talentdesk_core::AppError;

    use super::RetryPolicy;

    #[test]
    fn backoff_doubles_and_is_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100))
            .with_max_backoff(Duration::from_millis(350));
        assert_eq!(policy.backoff_after(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(350));
    }

    #[test]
    fn zero_attempts_are_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result = policy
            .run("flaky write", move || async move {
                let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if call < 3 {
                    Err(AppError::Unavailable("connection reset".to_owned()))
                } else {
                    Ok(call)
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn attempts_are_bounded() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let result: Result<(), _> = policy
            .run("always down", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Unavailable("down".to_owned()))
            })
            .await;

        let exhausted = result.err().unwrap_or_else(|| panic!("expected failure"));
        assert_eq!(exhausted.attempts, 2);
        assert_eq!(exhausted.operation, "always down");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failure_stops_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let result: Result<(), _> = policy
            .run("bad input", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Validation("rejected".to_owned()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
