//! Configuration schema definitions.
//!
//! This module defines the declarative data model for client definitions.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the client registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Client definitions, in declaration order.
    pub clients: Vec<ClientDefinition>,

    /// Transport-level options shared by all clients.
    pub http: HttpOptions,
}

/// One declared client.
///
/// A definition must name its target: either a logical `name`, or a
/// `contract_type` + `implementation_type` pair resolved by the dynamic
/// binder. Entries providing neither are rejected at load time.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClientDefinition {
    /// Logical name for name-based lookup.
    pub name: Option<String>,

    /// Base URL requests are resolved against (e.g. "https://api.example/billing").
    pub base_url: Option<String>,

    /// Bearer token attached as `Authorization: Bearer <token>`.
    pub auth_token: Option<String>,

    /// Contract type identifier for type-based lookup.
    pub contract_type: Option<String>,

    /// Implementation type identifier the binder resolves for the contract.
    pub implementation_type: Option<String>,

    /// Per-client resilience overrides; defaults apply when absent.
    pub resilience: Option<ResilienceOverrides>,
}

impl ClientDefinition {
    /// Definition addressed by logical name.
    pub fn named(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Definition addressed by contract type.
    pub fn typed(
        contract_type: impl Into<String>,
        implementation_type: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            contract_type: Some(contract_type.into()),
            implementation_type: Some(implementation_type.into()),
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Attach a bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Attach resilience overrides.
    pub fn with_resilience(mut self, overrides: ResilienceOverrides) -> Self {
        self.resilience = Some(overrides);
        self
    }

    /// The trimmed name, if one is declared and non-empty.
    pub fn declared_name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    /// The trimmed contract type, if declared and non-empty.
    pub fn declared_contract(&self) -> Option<&str> {
        non_empty(self.contract_type.as_deref())
    }

    /// The trimmed implementation type, if declared and non-empty.
    pub fn declared_implementation(&self) -> Option<&str> {
        non_empty(self.implementation_type.as_deref())
    }

    /// Label used in logs and error messages.
    pub(crate) fn label(&self) -> String {
        self.declared_name()
            .or_else(|| self.declared_contract())
            .map(String::from)
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Per-client overrides for the resilience pipeline.
///
/// `break_secs` exists because the inherited defaults differ between the
/// name-based (10s) and type-based (30s) registration paths; operators can
/// pin an explicit value per client instead.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ResilienceOverrides {
    /// Maximum retries after the first attempt (0 disables retries).
    pub max_attempts: Option<u32>,

    /// Consecutive failures before the circuit opens.
    pub failure_threshold: Option<u32>,

    /// Seconds the circuit stays open before allowing a probe.
    pub break_secs: Option<u64>,
}

/// Transport options shared by every client.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpOptions {
    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}
