//! Application services
//!
//! The construction engine is split by concern: constructor selection
//! (`builder`), the parameter chain (`parameters`) and property injection
//! (`injection`).

pub mod builder;
mod injection;
mod parameters;
pub mod type_resolver;

pub use builder::ConstructionEngine;
pub use type_resolver::{alias, TypeResolver};
