//! Plugin context: owns the tree and resolves path text to values.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::builder::ConstructionEngine;
use crate::application::services::type_resolver::TypeResolver;
use crate::application::types::{BuilderSettings, TypeRef};
use crate::config::Settings;
use crate::domain::{
    find_member, prepare_path_text, Builtin, DomainError, NodeId, NodeValue, ObtainMode,
    PathExpression, PluginTree, Value,
};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::ApplicationContext;

pub struct PluginContext {
    tree: PluginTree,
    container: ServiceContainer,
    application: Arc<dyn ApplicationContext>,
    resolver: TypeResolver,
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("application", &self.application.application_id())
            .field("nodes", &self.tree.len())
            .finish()
    }
}

impl PluginContext {
    pub fn new(
        tree: PluginTree,
        container: ServiceContainer,
        application: Arc<dyn ApplicationContext>,
    ) -> Self {
        let resolver = TypeResolver::new(
            Arc::clone(&container.loader),
            container.settings.standard_module_prefix.clone(),
        );
        Self {
            tree,
            container,
            application,
            resolver,
        }
    }

    pub fn tree(&self) -> &PluginTree {
        &self.tree
    }

    /// Mutable tree access for loaders growing the tree.
    pub fn tree_mut(&mut self) -> &mut PluginTree {
        &mut self.tree
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    pub fn settings(&self) -> &Settings {
        &self.container.settings
    }

    pub fn application(&self) -> &Arc<dyn ApplicationContext> {
        &self.application
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    /// Value of a node under a freshness directive.
    ///
    /// Only builtin nodes honor `mode`; custom values come back as is and
    /// empty nodes yield `None`.
    pub fn unwrap_value(
        &self,
        node: NodeId,
        mode: ObtainMode,
        settings: Option<&BuilderSettings>,
    ) -> ApplicationResult<Option<Value>> {
        let tree_node = self
            .tree
            .node(node)
            .ok_or_else(|| DomainError::NodeNotFound(format!("{node:?}")))?;

        match tree_node.value() {
            NodeValue::Empty => Ok(None),
            NodeValue::Custom(value) => Ok(Some(value.clone())),
            NodeValue::Builtin(builtin) => self.builtin_value(builtin, mode, settings),
        }
    }

    fn builtin_value(
        &self,
        builtin: &Arc<Builtin>,
        mode: ObtainMode,
        settings: Option<&BuilderSettings>,
    ) -> ApplicationResult<Option<Value>> {
        match mode {
            ObtainMode::Never => Ok(builtin.cached()),
            ObtainMode::Always => {
                let value = self.build(builtin, settings)?;
                builtin.store(value.clone());
                Ok(Some(value))
            }
            ObtainMode::Auto => {
                if let Some(cached) = builtin.cached().filter(|v| !v.is_null()) {
                    trace!("cache hit for {}", builtin);
                    return Ok(Some(cached));
                }
                let value = self.build(builtin, settings)?;
                Ok(Some(builtin.store_if_empty(value)))
            }
        }
    }

    /// Build a fresh value for a builtin, bypassing its cache.
    pub fn build(
        &self,
        builtin: &Arc<Builtin>,
        settings: Option<&BuilderSettings>,
    ) -> ApplicationResult<Value> {
        ConstructionEngine::new(self).build(builtin, settings, &[])
    }

    /// Declared type of a node's value, without building it.
    pub fn value_type(&self, node: NodeId) -> Option<TypeRef> {
        let type_name = match self.tree.node(node)?.value() {
            NodeValue::Empty => return None,
            NodeValue::Custom(value) => value.type_name(),
            NodeValue::Builtin(builtin) => match builtin.builtin_type() {
                Some(builtin_type) => builtin_type.type_name().to_string(),
                None => builtin.cached()?.type_name(),
            },
        };

        match self.resolver.resolve(&type_name) {
            Ok(ty) => ty,
            Err(e) => {
                debug!("no value type for {}: {}", self.tree.display(node), e);
                None
            }
        }
    }

    /// Resolve path text from the root.
    pub fn resolve_path(&self, text: &str) -> ApplicationResult<Option<Value>> {
        self.resolve_path_from(text, self.tree.root(), ObtainMode::Auto, None)
    }

    /// Resolve path text relative to `origin`.
    ///
    /// A marker in the text overrides `mode`. Text that is blank once the
    /// marker is stripped fails immediately with
    /// [`DomainError::InvalidPath`]; every other failure is wrapped
    /// into [`ApplicationError::PathResolution`] naming the origin's plugin
    /// file.
    #[instrument(level = "debug", skip(self, target_type))]
    pub fn resolve_path_from(
        &self,
        text: &str,
        origin: NodeId,
        mode: ObtainMode,
        target_type: Option<TypeRef>,
    ) -> ApplicationResult<Option<Value>> {
        let (rest, _) = prepare_path_text(text);
        if rest.trim().is_empty() {
            return Err(DomainError::InvalidPath(text.to_string()).into());
        }

        self.resolve_expression(text, origin, mode, target_type)
            .map_err(|source| ApplicationError::PathResolution {
                path: text.to_string(),
                file: self
                    .tree
                    .node(origin)
                    .and_then(|n| n.plugin())
                    .map(|p| p.file_name())
                    .unwrap_or_default(),
                source: Box::new(source),
            })
    }

    fn resolve_expression(
        &self,
        text: &str,
        origin: NodeId,
        mode: ObtainMode,
        target_type: Option<TypeRef>,
    ) -> ApplicationResult<Option<Value>> {
        let expression = PathExpression::parse(text)?;
        let mode = match expression.mode() {
            ObtainMode::Auto => mode,
            explicit => explicit,
        };

        let node = self
            .tree
            .find(origin, expression.path())
            .ok_or_else(|| ApplicationError::PathNotFound(expression.path().to_string()))?;

        let settings = target_type.map(BuilderSettings::target);
        let mut value = self.unwrap_value(node, mode, settings.as_ref())?;

        // Nothing to drill into yields nothing, at any hop.
        for member in expression.members() {
            match value {
                None | Some(Value::Null) => return Ok(None),
                Some(current) => value = Some(self.read_member(&current, member)?),
            }
        }
        Ok(value)
    }

    fn read_member(&self, value: &Value, member: &str) -> ApplicationResult<Value> {
        let not_found = |type_name: String| ApplicationError::MemberNotFound {
            member: member.to_string(),
            type_name,
        };

        let object = value
            .as_object()
            .ok_or_else(|| not_found(value.type_name()))?;

        let declared = find_member(&**object, member, self.settings().case_sensitive_members)
            .filter(|m| m.readable)
            .ok_or_else(|| not_found(object.type_name().to_string()))?;

        object
            .get_member(declared.name)
            .ok_or_else(|| not_found(object.type_name().to_string()))
    }

    /// The value at the configured workbench path.
    pub fn workbench(&self) -> ApplicationResult<Option<Value>> {
        self.resolve_path(&self.settings().workbench_path)
    }
}
