//! Declarative object activation over a hierarchical plugin tree.
//!
//! Nodes are addressed by path; their values are raw data or builtins that
//! are built on first demand: the target type is resolved, a constructor
//! is selected from the type's factory table, and declared properties and
//! injectable services are applied.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod util;
