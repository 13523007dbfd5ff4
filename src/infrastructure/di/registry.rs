//! In-memory capability providers
//!
//! Services are registered by name and/or by contract type name and handed
//! out as shared values.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::domain::{ServiceKey, ServiceProvider, Value};
use crate::infrastructure::traits::ServiceProviderFactory;

#[derive(Debug, Default)]
pub struct ServiceRegistry {
    named: RwLock<HashMap<String, Value>>,
    contracts: RwLock<HashMap<String, Value>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_named(&self, name: impl Into<String>, service: Value) {
        self.named.write().insert(name.into(), service);
    }

    pub fn register_contract(&self, contract: impl Into<String>, service: Value) {
        self.contracts.write().insert(contract.into(), service);
    }
}

impl ServiceProvider for ServiceRegistry {
    fn resolve(&self, key: ServiceKey<'_>) -> Option<Value> {
        trace!("resolve: {}", key);
        match key {
            ServiceKey::Name(name) => self.named.read().get(name).cloned(),
            ServiceKey::Contract(contract) => self.contracts.read().get(contract).cloned(),
        }
    }
}

/// Scope-name to provider mapping with a default provider.
#[derive(Debug)]
pub struct ProviderFactory {
    default: Arc<dyn ServiceProvider>,
    scoped: RwLock<HashMap<String, Arc<dyn ServiceProvider>>>,
}

impl ProviderFactory {
    pub fn new(default: Arc<dyn ServiceProvider>) -> Self {
        Self {
            default,
            scoped: RwLock::new(HashMap::new()),
        }
    }

    pub fn register(&self, scope: impl Into<String>, provider: Arc<dyn ServiceProvider>) {
        self.scoped.write().insert(scope.into(), provider);
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new(Arc::new(ServiceRegistry::new()))
    }
}

impl ServiceProviderFactory for ProviderFactory {
    fn get_provider(&self, scope: &str) -> Option<Arc<dyn ServiceProvider>> {
        self.scoped.read().get(scope).cloned()
    }

    fn default_provider(&self) -> Arc<dyn ServiceProvider> {
        Arc::clone(&self.default)
    }
}
