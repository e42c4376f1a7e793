//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every definition names a target: a name, or a contract/implementation pair
//! - Base URLs parse as absolute URLs
//! - No duplicate names or contract ids
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: RegistryConfig → Result<(), Vec<ValidationError>>
//! - Runs before any client is registered

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::RegistryConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Neither a name nor a contract/implementation pair was declared.
    #[error("client definition #{index} has neither a name nor a contract/implementation pair")]
    MissingTarget { index: usize },

    /// Only one half of the contract/implementation pair was declared.
    #[error("client definition #{index} declares an incomplete contract/implementation pair")]
    IncompleteBinding { index: usize },

    /// The same logical name was declared twice.
    #[error("duplicate client name '{name}'")]
    DuplicateName { name: String },

    /// The same contract type was declared twice.
    #[error("duplicate contract type '{contract}'")]
    DuplicateContract { contract: String },

    /// The base URL is not an absolute URL.
    #[error("client '{client}' has invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        client: String,
        url: String,
        reason: String,
    },

    /// A resilience override that must be positive was set to zero.
    #[error("client '{client}' has a zero-valued resilience override '{field}'")]
    ZeroOverride {
        client: String,
        field: &'static str,
    },

    /// The global request timeout must be positive.
    #[error("http.request_timeout_secs must be positive")]
    ZeroRequestTimeout,
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut names: HashSet<String> = HashSet::new();
    let mut contracts: HashSet<String> = HashSet::new();

    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for (index, def) in config.clients.iter().enumerate() {
        let name = def.declared_name();
        let contract = def.declared_contract();
        let implementation = def.declared_implementation();

        let has_pair = contract.is_some() && implementation.is_some();
        let has_half_pair = contract.is_some() != implementation.is_some();

        if name.is_none() && !has_pair && !has_half_pair {
            errors.push(ValidationError::MissingTarget { index });
        }
        if has_half_pair {
            errors.push(ValidationError::IncompleteBinding { index });
        }

        if let Some(name) = name {
            if !names.insert(name.to_string()) {
                errors.push(ValidationError::DuplicateName {
                    name: name.to_string(),
                });
            }
        }
        if let Some(contract) = contract.filter(|_| has_pair) {
            if !contracts.insert(contract.to_string()) {
                errors.push(ValidationError::DuplicateContract {
                    contract: contract.to_string(),
                });
            }
        }

        if let Some(url) = def.base_url.as_deref() {
            if let Err(e) = Url::parse(url) {
                errors.push(ValidationError::InvalidBaseUrl {
                    client: def.label(),
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        if let Some(overrides) = &def.resilience {
            // max_attempts = 0 is legal: it disables retries.
            if overrides.failure_threshold == Some(0) {
                errors.push(ValidationError::ZeroOverride {
                    client: def.label(),
                    field: "failure_threshold",
                });
            }
            if overrides.break_secs == Some(0) {
                errors.push(ValidationError::ZeroOverride {
                    client: def.label(),
                    field: "break_secs",
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Join errors into a single human-readable line.
pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
