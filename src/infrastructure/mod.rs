//! Infrastructure layer: collaborator implementations and DI container
//!
//! This layer implements the boundary traits and wires up the engine.

pub mod di;
pub mod traits;

pub use di::{ProviderFactory, ServiceContainer, ServiceRegistry};
pub use traits::{
    ApplicationContext, InMemoryModuleLoader, LiteralParser, ModuleLoader, NoOptions,
    OptionSource, ParseRequest, PlainTextParser, ServiceProviderFactory,
};
