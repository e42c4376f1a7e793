//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, requests pass through, failures counted
//! - Open: upstream assumed down, requests fail fast
//! - Half-Open: testing if the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= threshold
//! Open → Half-Open: after break duration elapses
//! Half-Open → Closed: probe request succeeds (failure counter reset)
//! Half-Open → Open: probe request fails (timer reset)
//! ```
//!
//! # Design Decisions
//! - Per-client breaker (not global); state is owned by one client only
//! - Fail fast in Open state (no waiting, no network call)
//! - Single probe in Half-Open (prevents hammering a recovering upstream)
//! - All fields move under one lock; two concurrent requests can never
//!   observe a half-flipped transition

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::client::ClientError;

/// Immutable circuit breaker parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerPolicy {
    /// Consecutive failures required to open the circuit.
    pub failure_threshold: u32,

    /// How long the circuit stays open before allowing a probe.
    pub break_duration: Duration,
}

impl CircuitBreakerPolicy {
    /// Default number of consecutive failures before the circuit opens.
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 2;

    /// Policy with the default failure threshold.
    pub fn standard(break_duration: Duration) -> Self {
        Self {
            failure_threshold: Self::DEFAULT_FAILURE_THRESHOLD,
            break_duration,
        }
    }

    /// Policy with explicit threshold and break duration.
    pub fn new(failure_threshold: u32, break_duration: Duration) -> Self {
        Self {
            failure_threshold,
            break_duration,
        }
    }

    /// Build a breaker instance starting in the Closed state.
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self)
    }
}

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum Inner {
    Closed { consecutive_failures: u32 },
    Open { opened_at: Instant },
    HalfOpen,
}

/// Three-state circuit breaker with lock-guarded transitions.
#[derive(Debug)]
pub struct CircuitBreaker {
    policy: CircuitBreakerPolicy,
    state: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(policy: CircuitBreakerPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(Inner::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn policy(&self) -> CircuitBreakerPolicy {
        self.policy
    }

    /// Snapshot of the current state. An Open circuit whose break duration
    /// has elapsed still reports Open; the transition to Half-Open happens
    /// when the next request asks for admission.
    pub fn state(&self) -> BreakerState {
        match *self.lock() {
            Inner::Closed { .. } => BreakerState::Closed,
            Inner::Open { .. } => BreakerState::Open,
            Inner::HalfOpen => BreakerState::HalfOpen,
        }
    }

    /// Ask the breaker whether a request may proceed.
    ///
    /// In the Open state the call is rejected until the break duration has
    /// elapsed, at which point exactly one caller is admitted as the
    /// Half-Open probe; everyone else keeps failing fast until the probe
    /// outcome is recorded.
    pub(crate) fn admit(&self) -> Result<(), ClientError> {
        let mut state = self.lock();
        match *state {
            Inner::Closed { .. } => Ok(()),
            Inner::Open { opened_at } => {
                if opened_at.elapsed() >= self.policy.break_duration {
                    tracing::debug!("circuit breaker half-open, admitting probe request");
                    *state = Inner::HalfOpen;
                    Ok(())
                } else {
                    Err(ClientError::BreakerOpen)
                }
            }
            Inner::HalfOpen => Err(ClientError::BreakerOpen),
        }
    }

    /// Record a successful outcome: resets the failure counter, and closes
    /// the circuit after a successful Half-Open probe.
    pub(crate) fn record_success(&self) {
        let mut state = self.lock();
        match *state {
            Inner::Closed { .. } => {
                *state = Inner::Closed {
                    consecutive_failures: 0,
                };
            }
            Inner::HalfOpen => {
                tracing::info!("circuit breaker closed after successful probe");
                *state = Inner::Closed {
                    consecutive_failures: 0,
                };
            }
            // A success from a request admitted before the circuit opened;
            // the open timer governs recovery.
            Inner::Open { .. } => {}
        }
    }

    /// Record a failed outcome: increments the consecutive-failure counter
    /// and opens the circuit at the threshold, or re-opens it after a
    /// failed probe (with a fresh timer).
    pub(crate) fn record_failure(&self) {
        let mut state = self.lock();
        match *state {
            Inner::Closed {
                consecutive_failures,
            } => {
                let failures = consecutive_failures + 1;
                if failures >= self.policy.failure_threshold {
                    tracing::warn!(
                        failures,
                        break_secs = self.policy.break_duration.as_secs(),
                        "circuit breaker opened"
                    );
                    *state = Inner::Open {
                        opened_at: Instant::now(),
                    };
                } else {
                    *state = Inner::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            Inner::HalfOpen => {
                tracing::warn!("probe request failed, circuit breaker re-opened");
                *state = Inner::Open {
                    opened_at: Instant::now(),
                };
            }
            Inner::Open { .. } => {}
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
