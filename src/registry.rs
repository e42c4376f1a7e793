//! Client registry façade.
//!
//! # Data Flow
//! ```text
//! RegistryConfig + TypeCatalog
//!     → validate_config (all errors, fatal for the build)
//!     → named definitions: one ResilientClient each, stored by name
//!     → typed definitions: TypeCatalog::bind, instance built once,
//!       stored by contract id
//!     → ClientRegistry (immutable, lock-free lookups)
//! ```
//!
//! # Design Decisions
//! - Registration is single-threaded, run-to-completion at startup; any
//!   failure aborts the whole build
//! - Every client gets its own retry policy and breaker; nothing is shared
//!   across unrelated clients
//! - Break-duration defaults differ by path (10s named, 30s typed), an
//!   inherited inconsistency kept deliberately and overridable per client

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::binder::{BindError, TypeCatalog};
use crate::client::{ClientError, HttpTransport, ResilientClient, Transport};
use crate::config::schema::{ClientDefinition, RegistryConfig};
use crate::config::validation::{join_errors, validate_config, ValidationError};
use crate::resilience::{CircuitBreakerPolicy, Pipeline, RetryPolicy};

/// Default break duration for clients registered by name.
pub const NAMED_BREAK_DURATION: Duration = Duration::from_secs(10);

/// Default break duration for clients registered by contract type.
pub const TYPED_BREAK_DURATION: Duration = Duration::from_secs(30);

/// Fatal startup errors raised while building the registry.
#[derive(Debug, Error)]
pub enum RegistryBuildError {
    #[error("invalid client definitions: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("binding '{contract}' -> '{implementation}' failed: {source}")]
    Bind {
        contract: String,
        implementation: String,
        #[source]
        source: BindError,
    },

    #[error("client '{client}': {source}")]
    Client {
        client: String,
        #[source]
        source: ClientError,
    },
}

/// Recoverable lookup errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no client registered under name '{0}'")]
    NameNotFound(String),

    #[error("no client registered for contract '{0}'")]
    ContractNotFound(String),

    #[error("contract '{0}' is registered with a different handle type")]
    ContractMismatch(String),
}

struct BoundContract {
    client: ResilientClient,
    handle: Box<dyn Any + Send + Sync>,
}

/// The façade: configured, policy-wrapped clients addressed by logical
/// name or by contract type.
///
/// Built once at startup; afterwards the registry is read-only and safe
/// for concurrent lookup from any number of threads.
pub struct ClientRegistry {
    named: HashMap<String, ResilientClient>,
    typed: HashMap<String, BoundContract>,
}

impl ClientRegistry {
    /// Build the registry from a validated configuration and a populated
    /// type catalog. Each client gets its own `reqwest`-backed transport
    /// with the configured request timeout.
    pub fn build(
        config: &RegistryConfig,
        catalog: &TypeCatalog,
    ) -> Result<Self, RegistryBuildError> {
        let timeout = Duration::from_secs(config.http.request_timeout_secs);
        Self::build_inner(config, catalog, &|label| {
            HttpTransport::new(timeout)
                .map(|t| Arc::new(t) as Arc<dyn Transport>)
                .map_err(|source| RegistryBuildError::Client {
                    client: label.to_string(),
                    source,
                })
        })
    }

    /// Build the registry with an externally supplied transport shared by
    /// every client. The seam used by tests and by embedders that manage
    /// their own HTTP stack.
    pub fn build_with_transport(
        config: &RegistryConfig,
        catalog: &TypeCatalog,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RegistryBuildError> {
        Self::build_inner(config, catalog, &|_| Ok(Arc::clone(&transport)))
    }

    fn build_inner(
        config: &RegistryConfig,
        catalog: &TypeCatalog,
        make_transport: &dyn Fn(&str) -> Result<Arc<dyn Transport>, RegistryBuildError>,
    ) -> Result<Self, RegistryBuildError> {
        validate_config(config).map_err(RegistryBuildError::Validation)?;

        let mut named = HashMap::new();
        let mut typed = HashMap::new();

        for def in &config.clients {
            if let Some(name) = def.declared_name() {
                let client =
                    build_client(def, name, NAMED_BREAK_DURATION, make_transport(name)?)?;
                tracing::info!(
                    name,
                    base_url = def.base_url.as_deref().unwrap_or(""),
                    "registered named client"
                );
                named.insert(name.to_string(), client);
            }

            if let (Some(contract), Some(implementation)) =
                (def.declared_contract(), def.declared_implementation())
            {
                let binding = catalog.bind(contract, implementation).map_err(|source| {
                    RegistryBuildError::Bind {
                        contract: contract.to_string(),
                        implementation: implementation.to_string(),
                        source,
                    }
                })?;
                let client =
                    build_client(def, contract, TYPED_BREAK_DURATION, make_transport(contract)?)?;
                let handle = binding.instantiate(client.clone());
                tracing::info!(
                    contract,
                    implementation,
                    base_url = def.base_url.as_deref().unwrap_or(""),
                    "registered typed client"
                );
                typed.insert(contract.to_string(), BoundContract { client, handle });
            }
        }

        Ok(Self { named, typed })
    }

    /// Look up a client by its logical name.
    pub fn get_by_name(&self, name: &str) -> Result<ResilientClient, RegistryError> {
        self.named
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NameNotFound(name.to_string()))
    }

    /// Look up the policy-wrapped client underlying a bound contract.
    pub fn get_by_contract(&self, contract: &str) -> Result<ResilientClient, RegistryError> {
        self.typed
            .get(contract)
            .map(|bound| bound.client.clone())
            .ok_or_else(|| RegistryError::ContractNotFound(contract.to_string()))
    }

    /// Look up the typed handle bound to a contract. `H` must be the handle
    /// type the contract was registered with (typically `Arc<dyn SomeApi>`).
    pub fn contract<H>(&self, contract: &str) -> Result<H, RegistryError>
    where
        H: Clone + Send + Sync + 'static,
    {
        let bound = self
            .typed
            .get(contract)
            .ok_or_else(|| RegistryError::ContractNotFound(contract.to_string()))?;
        bound
            .handle
            .downcast_ref::<H>()
            .cloned()
            .ok_or_else(|| RegistryError::ContractMismatch(contract.to_string()))
    }

    /// Registered logical names, in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(String::as_str)
    }

    /// Registered contract ids, in arbitrary order.
    pub fn contracts(&self) -> impl Iterator<Item = &str> {
        self.typed.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("typed", &self.typed.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn build_client(
    def: &ClientDefinition,
    label: &str,
    default_break: Duration,
    transport: Arc<dyn Transport>,
) -> Result<ResilientClient, RegistryBuildError> {
    let base_url = def
        .base_url
        .as_deref()
        .map(url::Url::parse)
        .transpose()
        .map_err(|e| RegistryBuildError::Client {
            client: label.to_string(),
            source: ClientError::Url(e.to_string()),
        })?;

    let overrides = def.resilience.unwrap_or_default();
    let retry = RetryPolicy::new(
        overrides
            .max_attempts
            .unwrap_or(RetryPolicy::DEFAULT_MAX_ATTEMPTS),
    );
    let breaker = CircuitBreakerPolicy::new(
        overrides
            .failure_threshold
            .unwrap_or(CircuitBreakerPolicy::DEFAULT_FAILURE_THRESHOLD),
        overrides
            .break_secs
            .map(Duration::from_secs)
            .unwrap_or(default_break),
    )
    .build();

    Ok(ResilientClient::new(
        label,
        base_url,
        def.auth_token.clone(),
        transport,
        Pipeline::new(retry, breaker),
    ))
}
