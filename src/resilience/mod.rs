//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request through a registered client:
//!     → pipeline.rs (circuit breaker gate: fail fast if Open, no network call)
//!     → retry.rs (run the dispatch, retry transient failures with backoff)
//!     → circuit_breaker.rs (record the post-retry outcome, open on threshold)
//! ```
//!
//! # Design Decisions
//! - One retry policy + one breaker per registered client; never shared
//!   across unrelated clients
//! - The breaker sees the outcome *after* retries: an exhausted retry
//!   sequence counts as a single failure, not one per attempt
//! - Retries only for transient failures (network errors, timeouts, 5xx);
//!   4xx responses propagate immediately
//! - Breaker state transitions happen under one lock so state, failure
//!   counter and opened-at timestamp move as a unit

pub mod backoff;
pub mod circuit_breaker;
pub mod pipeline;
pub mod retry;

pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerPolicy};
pub use pipeline::Pipeline;
pub use retry::RetryPolicy;
