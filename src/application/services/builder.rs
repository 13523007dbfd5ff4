//! Construction engine: builds the value of a builtin.
//!
//! 1. Explicit literal constructor arguments build directly.
//! 2. Otherwise the target type is the explicit type, the owner's element
//!    type, or the caller's hint, and constructors are tried greedily by
//!    descending arity.
//! 3. Declared properties, then injectable members, are applied.

use std::sync::Arc;

use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::application::context::PluginContext;
use crate::application::error::{ApplicationResult, BoxError, ConstructionError};
use crate::application::types::{
    Argument, Arguments, BuilderSettings, ComponentType, Constructor, ParamType, TypeRef,
};
use crate::domain::{Builtin, BuiltinType, Component, MemberType, ObtainMode, Value};

pub struct ConstructionEngine<'a> {
    pub(crate) ctx: &'a PluginContext,
}

impl<'a> ConstructionEngine<'a> {
    pub fn new(ctx: &'a PluginContext) -> Self {
        Self { ctx }
    }

    /// Build a fresh value for `builtin`. Caching is the caller's concern.
    #[instrument(level = "debug", skip_all, fields(builtin = %builtin))]
    pub fn build(
        &self,
        builtin: &Arc<Builtin>,
        settings: Option<&BuilderSettings>,
        ignored: &[&str],
    ) -> ApplicationResult<Value> {
        if let Some(builtin_type) = builtin.builtin_type() {
            if !builtin_type.constructor().is_empty() {
                return self.build_with_arguments(builtin, builtin_type, ignored);
            }
        }

        match self.target_type(builtin, settings)? {
            TypeRef::Component(component_type) => {
                let object = self.build_type(builtin, &component_type, ignored)?;
                Ok(Value::Object(object))
            }
            primitive @ TypeRef::Primitive(..) => Err(ConstructionError::NotConstructible {
                type_name: primitive.name(),
                builtin: builtin.to_string(),
            }
            .into()),
        }
    }

    fn target_type(
        &self,
        builtin: &Builtin,
        settings: Option<&BuilderSettings>,
    ) -> ApplicationResult<TypeRef> {
        if let Some(builtin_type) = builtin.builtin_type() {
            if let Some(ty) = self.ctx.resolver().resolve(builtin_type.type_name())? {
                return Ok(ty);
            }
        }
        if let Some(ty) = self.owner_element_type(builtin)? {
            trace!("target type from owner: {}", ty);
            return Ok(ty);
        }
        settings
            .and_then(|s| s.target_type.clone())
            .ok_or_else(|| {
                ConstructionError::UnknownTargetType {
                    builtin: builtin.to_string(),
                }
                .into()
            })
    }

    /// Element type declared by the node owning the builtin's node.
    ///
    /// The owner's declared type is consulted first (its element type, then
    /// the element type of its default property); an owner without a known
    /// type is asked through its cached value.
    pub fn owner_element_type(&self, builtin: &Builtin) -> ApplicationResult<Option<TypeRef>> {
        let tree = self.ctx.tree();
        let Some(owner) = builtin.node().and_then(|n| tree.owner_node(n)) else {
            return Ok(None);
        };

        let element = match self.ctx.value_type(owner) {
            Some(TypeRef::Component(owner_type)) => owner_type
                .element_type()
                .or_else(|| owner_type.default_property().map(|(_, element)| element))
                .map(str::to_string),
            Some(TypeRef::Primitive(..)) => None,
            None => self
                .ctx
                .unwrap_value(owner, ObtainMode::Never, None)?
                .as_ref()
                .and_then(Value::as_object)
                .and_then(|o| o.element_type().map(str::to_string)),
        };

        match element {
            Some(name) => Ok(self.ctx.resolver().resolve(&name)?),
            None => Ok(None),
        }
    }

    /// Build with the builtin's literal constructor arguments.
    fn build_with_arguments(
        &self,
        builtin: &Arc<Builtin>,
        builtin_type: &BuiltinType,
        ignored: &[&str],
    ) -> ApplicationResult<Value> {
        let arguments = builtin_type.constructor();
        let arity = arguments.len();
        let target = self
            .ctx
            .resolver()
            .resolve(builtin_type.type_name())?
            .ok_or_else(|| ConstructionError::UnknownTargetType {
                builtin: builtin.to_string(),
            })?;
        let instantiate = |source: BoxError| ConstructionError::Instantiate {
            type_name: builtin_type.type_name().to_string(),
            arity,
            source,
        };

        let component_type = match target {
            TypeRef::Primitive(kind, shape) => {
                if arity != 1 {
                    return Err(instantiate(
                        format!("'{}' takes exactly one argument", target.name()).into(),
                    )
                    .into());
                }
                let expected = Some(MemberType::Value(kind, shape));
                let value = self
                    .resolve_literal(builtin, arguments[0].raw(), "value", expected)
                    .map_err(instantiate)?;
                return Ok(value);
            }
            TypeRef::Component(component_type) => component_type,
        };

        let constructor = component_type
            .constructors()
            .iter()
            .find(|c| c.arity() == arity)
            .ok_or_else(|| instantiate(format!("no constructor takes {arity} arguments").into()))?;

        let values = arguments
            .iter()
            .zip(constructor.params())
            .map(|(argument, param)| {
                let expected = match argument.type_name() {
                    Some(type_name) => match self.ctx.resolver().resolve(type_name)? {
                        Some(TypeRef::Primitive(kind, shape)) => Some(MemberType::Value(kind, shape)),
                        _ => None,
                    },
                    None => match param.ty() {
                        ParamType::Value(kind, shape) => Some(MemberType::Value(*kind, *shape)),
                        _ => None,
                    },
                };
                self.resolve_literal(builtin, argument.raw(), param.name(), expected)
                    .map(Argument::Value)
            })
            .collect::<Result<Vec<_>, BoxError>>()
            .map_err(instantiate)?;

        let object = self.instantiate(builtin, &component_type, constructor, values, ignored)?;
        Ok(Value::Object(object))
    }

    /// Try constructors by descending arity; the first fully resolvable
    /// one wins. Equal arities keep declaration order.
    #[instrument(level = "debug", skip_all, fields(component_type = %component_type.name()))]
    pub fn build_type(
        &self,
        builtin: &Arc<Builtin>,
        component_type: &ComponentType,
        ignored: &[&str],
    ) -> ApplicationResult<Arc<dyn Component>> {
        if component_type.is_abstract() {
            return Err(ConstructionError::NotConstructible {
                type_name: component_type.name().to_string(),
                builtin: builtin.to_string(),
            }
            .into());
        }

        let candidates = component_type
            .constructors()
            .iter()
            .sorted_by(|a, b| b.arity().cmp(&a.arity()));

        for constructor in candidates {
            if let Some(values) = self.resolve_parameters(builtin, constructor.params())? {
                debug!("selected constructor with {} parameters", constructor.arity());
                return self.instantiate(builtin, component_type, constructor, values, ignored);
            }
        }

        Err(ConstructionError::NoMatchingConstructor {
            type_name: component_type.name().to_string(),
            builtin: builtin.to_string(),
        }
        .into())
    }

    fn instantiate(
        &self,
        builtin: &Arc<Builtin>,
        component_type: &ComponentType,
        constructor: &Constructor,
        values: Vec<Argument>,
        ignored: &[&str],
    ) -> ApplicationResult<Arc<dyn Component>> {
        let arguments = Arguments::new(values, self.ctx);
        let object: Arc<dyn Component> = constructor
            .invoke(&arguments)
            .map(Arc::<dyn Component>::from)
            .map_err(|source| ConstructionError::Instantiate {
                type_name: component_type.name().to_string(),
                arity: constructor.arity(),
                source,
            })?;

        self.update_properties(builtin, object.as_ref(), ignored)?;
        self.inject_services(builtin, component_type, object.as_ref())?;
        Ok(object)
    }
}
