//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! caller → ResilientClient::get/post/send
//!     → resolve URL against base, attach bearer token
//!     → resilience pipeline (breaker gate, retry loop)
//!     → Transport::send (reqwest in production, fakes in tests)
//!     → non-2xx status mapped to ClientError::Status
//! ```
//!
//! # Design Decisions
//! - `Transport` is the narrow seam to the HTTP library: it reports how the
//!   wire behaved and never classifies statuses
//! - `ResilientClient` is cheap to clone; clones share the same transport
//!   and the same breaker state
//! - Error taxonomy distinguishes transient failures (network, timeout,
//!   5xx) from terminal ones (4xx, open breaker)

pub mod error;
pub mod resilient;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use resilient::ResilientClient;
pub use transport::{HttpTransport, Transport, UpstreamRequest, UpstreamResponse};
