//! Constructor parameter resolution chain.
//!
//! Per parameter, in order: the builtin, its node, `name: string`, the
//! nearest service provider, the application, the nearest application
//! module, then plugin-scoped singletons matched by parameter kind.

use std::sync::Arc;

use tracing::trace;

use crate::application::error::ApplicationResult;
use crate::application::services::builder::ConstructionEngine;
use crate::application::types::{Argument, ParamType, Parameter};
use crate::domain::{Builtin, Component, ObtainMode, ServiceProvider, Shape, Value, ValueKind};

impl ConstructionEngine<'_> {
    /// Resolve every parameter, or `None` when any of them has no source.
    pub(crate) fn resolve_parameters(
        &self,
        builtin: &Arc<Builtin>,
        params: &[Parameter],
    ) -> ApplicationResult<Option<Vec<Argument>>> {
        let mut values = Vec::with_capacity(params.len());
        for param in params {
            match self.resolve_parameter(builtin, param)? {
                Some(value) => values.push(value),
                None => {
                    trace!("parameter '{}' unresolved", param.name());
                    return Ok(None);
                }
            }
        }
        Ok(Some(values))
    }

    fn resolve_parameter(
        &self,
        builtin: &Arc<Builtin>,
        param: &Parameter,
    ) -> ApplicationResult<Option<Argument>> {
        let argument = match param.ty() {
            ParamType::Builtin => Some(Argument::Builtin(Arc::clone(builtin))),
            ParamType::Node => builtin.node().map(Argument::Node),
            ParamType::Value(ValueKind::Text, Shape::Scalar)
                if param.name().eq_ignore_ascii_case("name") =>
            {
                Some(Argument::Text(builtin.name().to_string()))
            }
            ParamType::Services => Some(Argument::Services(self.find_service_provider(builtin)?)),
            ParamType::Application => {
                Some(Argument::Application(Arc::clone(self.ctx.application())))
            }
            ParamType::Module => Some(Argument::Module(self.find_application_module(builtin)?)),
            _ => self.obtain_parameter(builtin, param.ty()),
        };
        Ok(argument)
    }

    /// Plugin-scoped singletons, matched purely by parameter kind.
    fn obtain_parameter(&self, builtin: &Builtin, ty: &ParamType) -> Option<Argument> {
        let plugin = builtin.plugin().map(Arc::as_ref);
        let options = &self.ctx.container().options;
        let singleton = |value: Option<Value>| Argument::Value(value.unwrap_or(Value::Null));

        match ty {
            ParamType::Plugin => Some(Argument::Plugin(builtin.plugin().cloned())),
            ParamType::Context => Some(Argument::Context),
            ParamType::ServiceFactory => Some(Argument::Factory(Arc::clone(
                &self.ctx.container().providers,
            ))),
            ParamType::Profile => Some(singleton(options.profile(plugin))),
            ParamType::Configuration => Some(singleton(options.configuration(plugin))),
            ParamType::Options => Some(singleton(self.ctx.application().options())),
            ParamType::SettingsProvider => Some(singleton(options.settings_provider(plugin))),
            _ => None,
        }
    }

    /// Nearest ancestor whose value is an application module.
    ///
    /// The walk starts at the parent of the builtin's node; ancestors
    /// whose declared type is known and not a module are skipped without
    /// being built.
    pub(crate) fn find_application_module(
        &self,
        builtin: &Builtin,
    ) -> ApplicationResult<Option<Arc<dyn Component>>> {
        let Some(node) = builtin.node() else {
            return Ok(None);
        };

        for ancestor in self.ctx.tree().ancestors(node) {
            let candidate = self
                .ctx
                .value_type(ancestor)
                .map_or(true, |ty| ty.is_module());
            if !candidate {
                continue;
            }
            let value = self.ctx.unwrap_value(ancestor, ObtainMode::Auto, None)?;
            if let Some(object) = value.as_ref().and_then(|v| v.as_object()) {
                if object.as_module().is_some() {
                    return Ok(Some(Arc::clone(object)));
                }
            }
        }
        Ok(None)
    }

    /// Service provider for a builtin: the nearest module's services, else
    /// the provider scoped to the parent node's name, else the
    /// application's services.
    pub(crate) fn find_service_provider(
        &self,
        builtin: &Builtin,
    ) -> ApplicationResult<Arc<dyn ServiceProvider>> {
        if let Some(module) = self.find_application_module(builtin)? {
            if let Some(services) = module.as_module().and_then(|m| m.services()) {
                return Ok(services);
            }
        }

        let tree = self.ctx.tree();
        let scoped = builtin
            .node()
            .and_then(|node| tree.node(node)?.parent())
            .and_then(|parent| tree.node(parent))
            .and_then(|parent| self.ctx.container().providers.get_provider(parent.name()));

        Ok(scoped.unwrap_or_else(|| self.ctx.application().services()))
    }
}
