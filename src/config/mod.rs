//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RegistryConfig (validated, immutable)
//!     → consumed once by ClientRegistry::build
//! ```
//!
//! # Design Decisions
//! - The registry consumes an already-parsed RegistryConfig; file loading
//!   is a convenience layer on top
//! - Validation separates syntactic (serde) from semantic checks and
//!   returns all errors, not just the first
//! - Duplicate names and duplicate contract ids are rejected, never
//!   silently overwritten

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ClientDefinition, HttpOptions, RegistryConfig, ResilienceOverrides};
pub use validation::{validate_config, ValidationError};
