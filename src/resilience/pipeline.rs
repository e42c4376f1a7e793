//! Retry → circuit breaker composition.
//!
//! # Responsibilities
//! - Gate every dispatch on the breaker before any attempt is made
//! - Run the retry loop inside the gate
//! - Report the post-retry outcome to the breaker as a single observation
//!
//! # Design Decisions
//! - An Open breaker short-circuits before the first attempt: no network
//!   call and no backoff sleep
//! - Only transient failures count against the breaker; a 4xx response
//!   proves the upstream is answering and is recorded as a success

use std::future::Future;

use crate::client::ClientResult;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retry::RetryPolicy;

/// The per-client resilience pipeline: one retry policy and one breaker,
/// applied in that order to every outbound request.
#[derive(Debug)]
pub struct Pipeline {
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl Pipeline {
    pub fn new(retry: RetryPolicy, breaker: CircuitBreaker) -> Self {
        Self { retry, breaker }
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Execute `dispatch` through the pipeline.
    pub(crate) async fn execute<F, Fut, T>(&self, dispatch: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        self.breaker.admit()?;

        let outcome = self.retry.run(dispatch).await;
        match &outcome {
            Err(error) if error.is_transient() => self.breaker.record_failure(),
            _ => self.breaker.record_success(),
        }
        outcome
    }
}
