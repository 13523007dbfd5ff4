//! Factory table: constructible types, their constructors and injectable
//! members.
//!
//! Each type registers constructors as factory functions with declared
//! parameter kinds. The engine matches those declarations against its
//! parameter-resolution chain instead of inspecting live constructors.

use std::fmt;
use std::sync::Arc;

use crate::application::context::PluginContext;
use crate::application::error::{ArgumentError, BoxError};
use crate::domain::{Builtin, Component, NodeId, Plugin, ServiceProvider, Shape, Value, ValueKind};
use crate::infrastructure::traits::{ApplicationContext, ServiceProviderFactory};

/// Factory function building a component from resolved arguments.
pub type Factory =
    dyn Fn(&Arguments<'_>) -> Result<Box<dyn Component>, BoxError> + Send + Sync + 'static;

/// Declared kind of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// The construction descriptor itself.
    Builtin,
    /// The node the descriptor is bound to.
    Node,
    /// Nearest capability provider.
    Services,
    ServiceFactory,
    Application,
    /// Nearest ancestor application module (may be absent).
    Module,
    /// Owning plugin record (may be absent).
    Plugin,
    /// The plugin context running the construction.
    Context,
    Profile,
    Configuration,
    Options,
    SettingsProvider,
    /// A primitive value; only literal arguments (and `name: string`) fill it.
    Value(ValueKind, Shape),
    /// A component or contract type by name; only literal arguments fill it.
    Named(String),
}

impl ParamType {
    pub const fn text() -> Self {
        ParamType::Value(ValueKind::Text, Shape::Scalar)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    ty: ParamType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &ParamType {
        &self.ty
    }
}

/// Shorthand for [`Parameter::new`].
pub fn param(name: impl Into<String>, ty: ParamType) -> Parameter {
    Parameter::new(name, ty)
}

#[derive(Clone)]
pub struct Constructor {
    params: Vec<Parameter>,
    factory: Arc<Factory>,
}

impl Constructor {
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn invoke(&self, args: &Arguments<'_>) -> Result<Box<dyn Component>, BoxError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor").field("params", &self.params).finish()
    }
}

/// Member filled from a capability provider after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injectable {
    member: String,
    member_type: String,
    name: Option<String>,
    contract: Option<String>,
    provider: Option<String>,
}

impl Injectable {
    pub fn new(member: impl Into<String>, member_type: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            member_type: member_type.into(),
            name: None,
            contract: None,
            provider: None,
        }
    }

    /// Resolve by service name instead of type.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Resolve by this contract instead of the member type.
    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    /// Resolve from the named provider scope.
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn member_type(&self) -> &str {
        &self.member_type
    }

    pub fn service_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn service_contract(&self) -> Option<&str> {
        self.contract.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().filter(|p| !p.trim().is_empty())
    }
}

/// Registration of one constructible type.
#[derive(Debug)]
pub struct ComponentType {
    name: String,
    constructors: Vec<Constructor>,
    injectables: Vec<Injectable>,
    element_type: Option<String>,
    default_property: Option<(String, String)>,
    module: bool,
    is_abstract: bool,
}

impl ComponentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructors: Vec::new(),
            injectables: Vec::new(),
            element_type: None,
            default_property: None,
            module: false,
            is_abstract: false,
        }
    }

    /// Register a constructor. Declaration order breaks arity ties.
    pub fn with_constructor<F>(mut self, params: impl IntoIterator<Item = Parameter>, factory: F) -> Self
    where
        F: Fn(&Arguments<'_>) -> Result<Box<dyn Component>, BoxError> + Send + Sync + 'static,
    {
        self.constructors.push(Constructor {
            params: params.into_iter().collect(),
            factory: Arc::new(factory),
        });
        self
    }

    pub fn with_injectable(mut self, injectable: Injectable) -> Self {
        self.injectables.push(injectable);
        self
    }

    /// Declare this type a collection of `element_type`.
    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = Some(element_type.into());
        self
    }

    /// Declare the default property and the element type of its collection.
    pub fn with_default_property(
        mut self,
        property: impl Into<String>,
        element_type: impl Into<String>,
    ) -> Self {
        self.default_property = Some((property.into(), element_type.into()));
        self
    }

    /// Instances implement the application-module capability.
    pub fn as_module(mut self) -> Self {
        self.module = true;
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    pub fn injectables(&self) -> &[Injectable] {
        &self.injectables
    }

    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    pub fn default_property(&self) -> Option<(&str, &str)> {
        self.default_property
            .as_ref()
            .map(|(p, e)| (p.as_str(), e.as_str()))
    }

    pub fn is_module(&self) -> bool {
        self.module
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }
}

/// A resolved type.
#[derive(Clone)]
pub enum TypeRef {
    Primitive(ValueKind, Shape),
    Component(Arc<ComponentType>),
}

impl TypeRef {
    pub fn name(&self) -> String {
        match self {
            TypeRef::Primitive(kind, Shape::Scalar) => kind.name().to_string(),
            TypeRef::Primitive(kind, Shape::Nullable) => format!("{}?", kind.name()),
            TypeRef::Primitive(kind, Shape::Array) => format!("{}[]", kind.name()),
            TypeRef::Component(ty) => ty.name().to_string(),
        }
    }

    pub fn as_component(&self) -> Option<&Arc<ComponentType>> {
        match self {
            TypeRef::Component(ty) => Some(ty),
            TypeRef::Primitive(..) => None,
        }
    }

    pub fn is_module(&self) -> bool {
        self.as_component().is_some_and(|ty| ty.is_module())
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TypeRef::Primitive(a, s), TypeRef::Primitive(b, t)) => a == b && s == t,
            (TypeRef::Component(a), TypeRef::Component(b)) => {
                Arc::ptr_eq(a, b) || a.name() == b.name()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Caller hints for a build.
#[derive(Debug, Clone, Default)]
pub struct BuilderSettings {
    pub target_type: Option<TypeRef>,
}

impl BuilderSettings {
    pub fn target(target_type: TypeRef) -> Self {
        Self {
            target_type: Some(target_type),
        }
    }
}

/// A resolved constructor argument.
#[derive(Debug, Clone)]
pub enum Argument {
    Builtin(Arc<Builtin>),
    Node(NodeId),
    Text(String),
    Services(Arc<dyn ServiceProvider>),
    Factory(Arc<dyn ServiceProviderFactory>),
    Application(Arc<dyn ApplicationContext>),
    Module(Option<Arc<dyn Component>>),
    Plugin(Option<Arc<Plugin>>),
    Context,
    Value(Value),
}

/// Arguments handed to a factory, with access to the running context.
pub struct Arguments<'a> {
    values: Vec<Argument>,
    context: &'a PluginContext,
}

impl<'a> Arguments<'a> {
    pub(crate) fn new(values: Vec<Argument>, context: &'a PluginContext) -> Self {
        Self { values, context }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    pub fn context(&self) -> &'a PluginContext {
        self.context
    }

    fn at(&self, index: usize) -> Result<&Argument, ArgumentError> {
        self.values.get(index).ok_or(ArgumentError::Missing(index))
    }

    pub fn text(&self, index: usize) -> Result<&str, ArgumentError> {
        match self.at(index)? {
            Argument::Text(s) | Argument::Value(Value::Text(s)) => Ok(s),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "text",
            }),
        }
    }

    pub fn value(&self, index: usize) -> Result<&Value, ArgumentError> {
        match self.at(index)? {
            Argument::Value(v) => Ok(v),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "value",
            }),
        }
    }

    pub fn builtin(&self, index: usize) -> Result<&Arc<Builtin>, ArgumentError> {
        match self.at(index)? {
            Argument::Builtin(b) => Ok(b),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "builtin",
            }),
        }
    }

    pub fn node(&self, index: usize) -> Result<NodeId, ArgumentError> {
        match self.at(index)? {
            Argument::Node(n) => Ok(*n),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "node",
            }),
        }
    }

    pub fn services(&self, index: usize) -> Result<Arc<dyn ServiceProvider>, ArgumentError> {
        match self.at(index)? {
            Argument::Services(s) => Ok(Arc::clone(s)),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "service provider",
            }),
        }
    }

    pub fn factory(&self, index: usize) -> Result<Arc<dyn ServiceProviderFactory>, ArgumentError> {
        match self.at(index)? {
            Argument::Factory(f) => Ok(Arc::clone(f)),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "service provider factory",
            }),
        }
    }

    pub fn application(&self, index: usize) -> Result<Arc<dyn ApplicationContext>, ArgumentError> {
        match self.at(index)? {
            Argument::Application(a) => Ok(Arc::clone(a)),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "application context",
            }),
        }
    }

    pub fn module(&self, index: usize) -> Result<Option<Arc<dyn Component>>, ArgumentError> {
        match self.at(index)? {
            Argument::Module(m) => Ok(m.clone()),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "application module",
            }),
        }
    }

    pub fn plugin(&self, index: usize) -> Result<Option<Arc<Plugin>>, ArgumentError> {
        match self.at(index)? {
            Argument::Plugin(p) => Ok(p.clone()),
            _ => Err(ArgumentError::Mismatch {
                index,
                expected: "plugin",
            }),
        }
    }
}
