//! Configuration-driven registry of resilient HTTP clients.
//!
//! Each registered client is pre-wired with a base URL, an optional bearer
//! token, and a two-stage resilience pipeline: bounded retry with
//! exponential backoff, then a circuit breaker. Clients are addressed by a
//! declared logical name or by an abstract contract type resolved at
//! runtime from an identifier supplied in configuration.
//!
//! # Architecture Overview
//!
//! ```text
//! config file / RegistryConfig
//!         │
//!         ▼
//!   ┌────────────┐     ┌─────────────┐
//!   │  config    │────▶│  registry   │◀──── TypeCatalog (binder)
//!   │ validation │     │   build     │
//!   └────────────┘     └─────┬───────┘
//!                            │ one per client
//!                            ▼
//!                  ┌──────────────────┐
//!   lookup ───────▶│ ResilientClient  │
//!   by name /      │  retry → breaker │────▶ HTTP transport (reqwest)
//!   by contract    └──────────────────┘
//! ```

// Core subsystems
pub mod binder;
pub mod client;
pub mod config;
pub mod registry;
pub mod resilience;

pub use binder::{BindError, Binding, TypeCatalog};
pub use client::{ClientError, ClientResult, ResilientClient};
pub use config::{ClientDefinition, ConfigError, RegistryConfig};
pub use registry::{ClientRegistry, RegistryBuildError, RegistryError};
pub use resilience::{BreakerState, CircuitBreakerPolicy, RetryPolicy};
