//! Dependency-injection wiring

pub mod registry;
pub mod service_container;

pub use registry::{ProviderFactory, ServiceRegistry};
pub use service_container::ServiceContainer;
