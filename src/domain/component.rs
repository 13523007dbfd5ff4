//! Component capability traits.
//!
//! Instances built from builtins are trait objects. Member access replaces
//! runtime reflection: each component declares the members it exposes and
//! answers reads and writes by name.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::domain::error::DomainResult;
use crate::domain::value::{Shape, Value, ValueKind};

/// Declared type of a component member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberType {
    /// A primitive kind; raw text is converted before assignment.
    Value(ValueKind, Shape),
    /// A component or contract type, by fully qualified name.
    Named(&'static str),
    /// Accepts any value unchanged.
    Any,
}

/// Metadata of a readable and/or writable member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub name: &'static str,
    pub ty: MemberType,
    pub readable: bool,
    pub writable: bool,
}

impl Member {
    pub const fn new(name: &'static str, ty: MemberType) -> Self {
        Self {
            name,
            ty,
            readable: true,
            writable: true,
        }
    }

    pub const fn read_only(name: &'static str, ty: MemberType) -> Self {
        Self {
            name,
            ty,
            readable: true,
            writable: false,
        }
    }

    pub const fn write_only(name: &'static str, ty: MemberType) -> Self {
        Self {
            name,
            ty,
            readable: false,
            writable: true,
        }
    }
}

/// An object materialized from the plugin tree.
pub trait Component: Any + Send + Sync + fmt::Debug {
    /// Fully qualified name of the component's type.
    fn type_name(&self) -> &str;

    /// Members exposed for declarative assignment and member drill-down.
    fn members(&self) -> &'static [Member] {
        &[]
    }

    /// Read a member by its declared name.
    fn get_member(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// Assign a member by its declared name.
    ///
    /// Instances are shared behind `Arc` once built, so writable state lives
    /// behind a lock. Implementations may accept names not listed in
    /// [`Component::members`] (indexers, dynamic bags).
    fn set_member(&self, name: &str, value: Value) -> DomainResult<()> {
        let _ = value;
        Err(crate::domain::DomainError::member_not_found(name, self.type_name()))
    }

    /// Element type name, when this instance is a typed collection.
    fn element_type(&self) -> Option<&str> {
        None
    }

    /// Application-module capability.
    fn as_module(&self) -> Option<&dyn ApplicationModule> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Look up a declared member by name, ignoring ASCII case unless `case_sensitive`.
pub fn find_member(component: &dyn Component, name: &str, case_sensitive: bool) -> Option<&'static Member> {
    component.members().iter().find(|m| {
        if case_sensitive {
            m.name == name
        } else {
            m.name.eq_ignore_ascii_case(name)
        }
    })
}

/// Key used to resolve a dependency from a [`ServiceProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKey<'a> {
    Name(&'a str),
    Contract(&'a str),
}

impl fmt::Display for ServiceKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Name(name) => write!(f, "name '{name}'"),
            ServiceKey::Contract(contract) => write!(f, "contract '{contract}'"),
        }
    }
}

/// Capability registry resolving dependencies by name or contract type.
pub trait ServiceProvider: Send + Sync + fmt::Debug {
    fn resolve(&self, key: ServiceKey<'_>) -> Option<Value>;
}

/// Marks a component as an application module with its own services.
pub trait ApplicationModule: Send + Sync {
    fn name(&self) -> &str;

    fn services(&self) -> Option<Arc<dyn ServiceProvider>>;
}
