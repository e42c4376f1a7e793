//! Retry policy for transient upstream failures.
//!
//! # Responsibilities
//! - Determine if a failure is retryable (network error, timeout, 5xx)
//! - Re-run the dispatch with exponential backoff between attempts
//!
//! # Design Decisions
//! - 4xx responses are never retried (client error, not upstream)
//! - `max_attempts` counts retries *after* the first try, so a request is
//!   dispatched at most `1 + max_attempts` times
//! - Backoff sleeps go through Tokio so tests can run on a paused clock

use std::future::Future;
use std::time::Duration;

use crate::client::ClientResult;
use crate::resilience::backoff::backoff_delay;

/// Immutable retry policy: bounded attempts with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl RetryPolicy {
    /// Default number of retries after the first attempt.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

    /// Policy with the default attempt budget and one-second backoff unit.
    pub fn standard() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }

    /// Policy retrying up to `max_attempts` times with delays of
    /// 1s, 2s, 4s, ... before each retry.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_unit: Duration::from_secs(1),
        }
    }

    /// Maximum number of retries after the first attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay applied before retry `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        backoff_delay(attempt, self.backoff_unit)
    }

    /// Run `dispatch`, retrying transient failures until the attempt budget
    /// is exhausted. The final outcome (success or last error) is returned.
    pub(crate) async fn run<F, Fut, T>(&self, mut dispatch: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let mut outcome = dispatch().await;
        let mut attempt = 0;

        while attempt < self.max_attempts {
            match &outcome {
                Err(error) if error.is_transient() => {
                    let delay = self.delay(attempt);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "transient failure, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    outcome = dispatch().await;
                    attempt += 1;
                }
                _ => break,
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_success_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = RetryPolicy::standard()
            .run(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ClientError>(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: ClientResult<()> = RetryPolicy::new(2)
            .run(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Timeout)
                }
            })
            .await;
        assert!(matches!(result, Err(ClientError::Timeout)));
        // Initial attempt plus two retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delays_follow_schedule() {
        let start = tokio::time::Instant::now();
        let _: ClientResult<()> = RetryPolicy::new(2)
            .run(|| async { Err(ClientError::Timeout) })
            .await;
        // 2^0 + 2^1 seconds of backoff on the paused clock.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: ClientResult<()> = RetryPolicy::standard()
            .run(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Status(StatusCode::NOT_FOUND))
                }
            })
            .await;
        assert!(matches!(result, Err(ClientError::Status(s)) if s == StatusCode::NOT_FOUND));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_mid_sequence() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = RetryPolicy::new(2)
            .run(move || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 1 {
                        Err(ClientError::Status(StatusCode::SERVICE_UNAVAILABLE))
                    } else {
                        Ok("recovered")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_means_single_dispatch() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result: ClientResult<()> = RetryPolicy::new(0)
            .run(move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Timeout)
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
