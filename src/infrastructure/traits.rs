//! Collaborator boundary traits
//!
//! The activation engine consumes module loading, literal parsing,
//! provider lookup, the host application and option storage only through
//! these traits, so hosts and tests can plug their own implementations.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::application::error::BoxError;
use crate::application::module::{Module, ModuleRef};
use crate::domain::{Builtin, MemberType, NodeId, Plugin, ServiceProvider, Value};

/// Loads modules that supply constructible types.
pub trait ModuleLoader: Send + Sync {
    /// Modules already loaded in the process.
    fn loaded(&self) -> Vec<Arc<Module>>;

    /// Load a module by reference; `None` when it cannot be found.
    fn load(&self, module: &ModuleRef) -> Option<Arc<Module>>;

    /// Platform-default loading for standard-library modules.
    fn load_standard(&self, name: &str) -> Option<Arc<Module>>;
}

/// What a literal is being parsed for.
#[derive(Debug, Clone, Copy)]
pub struct ParseRequest<'a> {
    pub node: Option<NodeId>,
    pub builtin: Option<&'a Builtin>,
    pub member_name: &'a str,
    pub member_type: Option<MemberType>,
}

/// Expression parser for declarative text (e.g. `{path:/A/B}` references).
pub trait LiteralParser: Send + Sync {
    fn can_parse(&self, text: &str) -> bool;

    fn parse(&self, text: &str, request: &ParseRequest<'_>) -> Result<Value, BoxError>;
}

/// Named capability-provider registry.
pub trait ServiceProviderFactory: Send + Sync + fmt::Debug {
    /// Provider registered for a scope name.
    fn get_provider(&self, scope: &str) -> Option<Arc<dyn ServiceProvider>>;

    fn default_provider(&self) -> Arc<dyn ServiceProvider>;
}

/// The hosting application.
pub trait ApplicationContext: Send + Sync + fmt::Debug {
    fn application_id(&self) -> &str;

    fn services(&self) -> Arc<dyn ServiceProvider>;

    /// Application option provider.
    fn options(&self) -> Option<Value> {
        None
    }
}

/// Profile, configuration and settings objects scoped to a plugin.
pub trait OptionSource: Send + Sync {
    fn profile(&self, plugin: Option<&Plugin>) -> Option<Value>;

    fn configuration(&self, plugin: Option<&Plugin>) -> Option<Value>;

    fn settings_provider(&self, plugin: Option<&Plugin>) -> Option<Value>;
}

// ============================================================
// DEFAULT IMPLEMENTATIONS
// ============================================================

/// Module loader over an in-process module set.
///
/// Staged modules become loaded on their first successful `load`.
#[derive(Debug, Default)]
pub struct InMemoryModuleLoader {
    loaded: RwLock<Vec<Arc<Module>>>,
    staged: RwLock<Vec<Arc<Module>>>,
    standard: RwLock<Vec<Arc<Module>>>,
}

impl InMemoryModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already loaded module.
    pub fn register(&self, module: Module) -> Arc<Module> {
        let module = Arc::new(module);
        self.loaded.write().push(Arc::clone(&module));
        module
    }

    /// Make a module loadable without loading it yet.
    pub fn stage(&self, module: Module) {
        self.staged.write().push(Arc::new(module));
    }

    /// Make a module available to standard loading.
    pub fn stage_standard(&self, module: Module) {
        self.standard.write().push(Arc::new(module));
    }
}

impl ModuleLoader for InMemoryModuleLoader {
    fn loaded(&self) -> Vec<Arc<Module>> {
        self.loaded.read().clone()
    }

    fn load(&self, module: &ModuleRef) -> Option<Arc<Module>> {
        let mut staged = self.staged.write();
        let position = staged.iter().position(|m| module.matches(m))?;
        let found = staged.remove(position);
        self.loaded.write().push(Arc::clone(&found));
        Some(found)
    }

    fn load_standard(&self, name: &str) -> Option<Arc<Module>> {
        let found = self
            .standard
            .read()
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .cloned()?;
        self.loaded.write().push(Arc::clone(&found));
        Some(found)
    }
}

/// Parser that recognizes nothing: declarative text stays text.
#[derive(Debug, Default)]
pub struct PlainTextParser;

impl LiteralParser for PlainTextParser {
    fn can_parse(&self, _text: &str) -> bool {
        false
    }

    fn parse(&self, text: &str, _request: &ParseRequest<'_>) -> Result<Value, BoxError> {
        Ok(Value::Text(text.to_string()))
    }
}

/// Option source without any profiles or settings.
#[derive(Debug, Default)]
pub struct NoOptions;

impl OptionSource for NoOptions {
    fn profile(&self, _plugin: Option<&Plugin>) -> Option<Value> {
        None
    }

    fn configuration(&self, _plugin: Option<&Plugin>) -> Option<Value> {
        None
    }

    fn settings_provider(&self, _plugin: Option<&Plugin>) -> Option<Value> {
        None
    }
}
