//! Application layer: type resolution, construction and path resolution
//!
//! This layer orchestrates domain logic and consumes collaborators only
//! through the infrastructure boundary traits.

pub mod context;
pub mod error;
pub mod module;
pub mod services;
pub mod types;

pub use context::PluginContext;
pub use error::{
    ApplicationError, ApplicationResult, ArgumentError, BoxError, ConstructionError,
    TypeResolutionError,
};
pub use module::{Module, ModuleRef, ModuleVersion};
pub use services::{ConstructionEngine, TypeResolver};
pub use types::{
    param, Argument, Arguments, BuilderSettings, ComponentType, Constructor, Injectable,
    ParamType, Parameter, TypeRef,
};
