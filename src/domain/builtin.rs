//! Construction descriptors ("builtins").
//!
//! A builtin is a declarative recipe for lazily building the value of
//! exactly one tree node. Apart from its cached value it is immutable once
//! the loader has produced it.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::plugin::Plugin;
use crate::domain::property::PropertyCollection;
use crate::domain::tree::NodeId;
use crate::domain::value::Value;

/// Literal constructor argument, resolved against the parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorArgument {
    raw: String,
    type_name: Option<String>,
}

impl ConstructorArgument {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            type_name: None,
        }
    }

    /// Argument with an explicit type, overriding the parameter's.
    pub fn typed(raw: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            type_name: Some(type_name.into()),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }
}

/// Explicit target type of a builtin, optionally with literal arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinType {
    type_name: String,
    constructor: Vec<ConstructorArgument>,
}

impl BuiltinType {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            constructor: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: ConstructorArgument) -> Self {
        self.constructor.push(argument);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn constructor(&self) -> &[ConstructorArgument] {
        &self.constructor
    }
}

/// Whether a built value is kept for later `Auto` reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    #[default]
    Shared,
    /// Never cached: every read builds a fresh value.
    Transient,
}

#[derive(Debug)]
pub struct Builtin {
    name: String,
    builtin_type: Option<BuiltinType>,
    properties: PropertyCollection,
    plugin: Option<Arc<Plugin>>,
    policy: CachePolicy,
    node: OnceLock<NodeId>,
    cache: RwLock<Option<Value>>,
}

impl Builtin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            builtin_type: None,
            properties: PropertyCollection::new(),
            plugin: None,
            policy: CachePolicy::Shared,
            node: OnceLock::new(),
            cache: RwLock::new(None),
        }
    }

    pub fn with_type(mut self, builtin_type: BuiltinType) -> Self {
        self.builtin_type = Some(builtin_type);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.properties.set(name, raw);
        self
    }

    pub fn with_plugin(mut self, plugin: Arc<Plugin>) -> Self {
        self.plugin = Some(plugin);
        self
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn builtin_type(&self) -> Option<&BuiltinType> {
        self.builtin_type.as_ref()
    }

    pub fn properties(&self) -> &PropertyCollection {
        &self.properties
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }

    pub fn plugin(&self) -> Option<&Arc<Plugin>> {
        self.plugin.as_ref()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Node this builtin is bound to.
    pub fn node(&self) -> Option<NodeId> {
        self.node.get().copied()
    }

    /// Bind to a node. Binding happens once and cannot be undone.
    pub(crate) fn bind(&self, node: NodeId) -> DomainResult<()> {
        self.node.set(node).map_err(|_| DomainError::AlreadyBound {
            builtin: self.to_string(),
        })
    }

    /// Currently cached value.
    pub fn cached(&self) -> Option<Value> {
        self.cache.read().clone()
    }

    /// Store a freshly built value, replacing any cached one.
    pub fn store(&self, value: Value) {
        if self.policy == CachePolicy::Shared {
            *self.cache.write() = Some(value);
        }
    }

    /// Store a value unless another caller cached one first; returns the winner.
    pub fn store_if_empty(&self, value: Value) -> Value {
        if self.policy == CachePolicy::Transient {
            return value;
        }
        let mut cache = self.cache.write();
        match cache.as_ref() {
            Some(existing) if !existing.is_null() => existing.clone(),
            _ => {
                *cache = Some(value.clone());
                value
            }
        }
    }

    pub fn clear_cache(&self) {
        *self.cache.write() = None;
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.plugin {
            Some(plugin) => write!(f, "{}@{}", self.name, plugin),
            None => write!(f, "{}", self.name),
        }
    }
}
