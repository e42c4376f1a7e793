//! Request-time error taxonomy.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by a [`ResilientClient`](crate::client::ResilientClient)
/// request.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Upstream answered with a non-2xx status.
    #[error("upstream returned status {0}")]
    Status(StatusCode),

    /// Connection-level failure (DNS, connect, reset, protocol).
    #[error("network error: {0}")]
    Network(String),

    /// The request exceeded the transport timeout.
    #[error("request timed out")]
    Timeout,

    /// The circuit breaker is open; no network call was made.
    #[error("circuit breaker is open")]
    BreakerOpen,

    /// The request path could not be resolved into a valid URL.
    #[error("invalid request URL: {0}")]
    Url(String),

    /// The underlying HTTP client could not be constructed.
    #[error("transport setup failed: {0}")]
    Transport(String),
}

impl ClientError {
    /// Whether the failure is retry-eligible: network errors, timeouts and
    /// 5xx responses. 4xx responses and an open breaker are terminal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout => true,
            Self::Status(status) => status.is_server_error(),
            Self::BreakerOpen | Self::Url(_) | Self::Transport(_) => false,
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
