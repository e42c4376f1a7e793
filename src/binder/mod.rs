//! Dynamic binding of contract types to implementations.
//!
//! # Responsibilities
//! - Hold the process-known set of contract and implementation types
//! - Resolve a pair of string identifiers from configuration into a
//!   factory for policy-wrapped client instances
//! - Reject unknown identifiers and implementations that do not satisfy
//!   the requested contract
//!
//! # Design Decisions
//! - No reflection: the catalog is an explicit table populated at startup,
//!   mapping known string identifiers to typed constructor closures
//! - A contract registers the handle type callers will receive (typically
//!   `Arc<dyn SomeApi>`); an implementation registers one constructor per
//!   contract it satisfies
//! - Handle types are checked with `TypeId` at bind time, so a registry
//!   lookup can never hand out the wrong type

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::client::ResilientClient;

/// Errors raised while resolving a contract/implementation pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// The identifier does not resolve to any registered type.
    #[error("unknown type identifier '{identifier}'")]
    TypeResolution { identifier: String },

    /// The implementation exists but does not satisfy the contract.
    #[error("implementation '{implementation}' does not satisfy contract '{contract}'")]
    ContractMismatch {
        contract: String,
        implementation: String,
    },
}

type ErasedFactory = Arc<dyn Fn(ResilientClient) -> Box<dyn Any + Send + Sync> + Send + Sync>;

struct ContractEntry {
    handle_type: TypeId,
    handle_name: &'static str,
}

struct Constructor {
    handle_type: TypeId,
    factory: ErasedFactory,
}

#[derive(Default)]
struct ImplementationEntry {
    constructors: HashMap<String, Constructor>,
}

/// The set of contract and implementation types known to the process.
///
/// Populated once, single-threaded, before the registry is built:
///
/// ```ignore
/// let mut catalog = TypeCatalog::new();
/// catalog.register_contract::<Arc<dyn QuoteApi>>("IQuoteApi");
/// catalog.register_implementation("QuoteClient", "IQuoteApi", |client| {
///     Arc::new(QuoteClient::new(client)) as Arc<dyn QuoteApi>
/// });
/// ```
#[derive(Default)]
pub struct TypeCatalog {
    contracts: HashMap<String, ContractEntry>,
    implementations: HashMap<String, ImplementationEntry>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract under `id`. `H` is the handle type callers
    /// receive from the registry, typically `Arc<dyn SomeApi>`.
    pub fn register_contract<H>(&mut self, id: impl Into<String>) -> &mut Self
    where
        H: Send + Sync + 'static,
    {
        self.contracts.insert(
            id.into(),
            ContractEntry {
                handle_type: TypeId::of::<H>(),
                handle_name: type_name::<H>(),
            },
        );
        self
    }

    /// Register an implementation under `implementation_id`, declaring that
    /// it satisfies `contract_id` via the given constructor. Call once per
    /// contract the implementation satisfies.
    pub fn register_implementation<H, F>(
        &mut self,
        implementation_id: impl Into<String>,
        contract_id: impl Into<String>,
        constructor: F,
    ) -> &mut Self
    where
        H: Send + Sync + 'static,
        F: Fn(ResilientClient) -> H + Send + Sync + 'static,
    {
        let entry = self
            .implementations
            .entry(implementation_id.into())
            .or_default();
        entry.constructors.insert(
            contract_id.into(),
            Constructor {
                handle_type: TypeId::of::<H>(),
                factory: Arc::new(move |client| {
                    Box::new(constructor(client)) as Box<dyn Any + Send + Sync>
                }),
            },
        );
        self
    }

    /// Resolve a contract/implementation identifier pair into a binding.
    pub fn bind(&self, contract: &str, implementation: &str) -> Result<Binding, BindError> {
        let contract_entry =
            self.contracts
                .get(contract)
                .ok_or_else(|| BindError::TypeResolution {
                    identifier: contract.to_string(),
                })?;
        let impl_entry =
            self.implementations
                .get(implementation)
                .ok_or_else(|| BindError::TypeResolution {
                    identifier: implementation.to_string(),
                })?;

        let mismatch = || BindError::ContractMismatch {
            contract: contract.to_string(),
            implementation: implementation.to_string(),
        };
        let constructor = impl_entry.constructors.get(contract).ok_or_else(mismatch)?;
        if constructor.handle_type != contract_entry.handle_type {
            // The implementation claims the contract but constructs a
            // different handle type than the contract registered.
            return Err(mismatch());
        }

        Ok(Binding {
            contract: contract.to_string(),
            implementation: implementation.to_string(),
            handle_name: contract_entry.handle_name,
            factory: Arc::clone(&constructor.factory),
        })
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field(
                "implementations",
                &self.implementations.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// A resolved contract/implementation pair, ready to manufacture instances.
#[derive(Clone)]
pub struct Binding {
    contract: String,
    implementation: String,
    handle_name: &'static str,
    factory: ErasedFactory,
}

impl Binding {
    /// Contract identifier this binding serves.
    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Implementation identifier the binder resolved.
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Produce an instance wrapping the given policy-wrapped client. The
    /// boxed value holds the handle type the contract registered.
    pub(crate) fn instantiate(&self, client: ResilientClient) -> Box<dyn Any + Send + Sync> {
        (self.factory)(client)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("contract", &self.contract)
            .field("implementation", &self.implementation)
            .field("handle", &self.handle_name)
            .finish()
    }
}
