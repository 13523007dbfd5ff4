//! Service container for dependency injection
//!
//! Wires up the collaborators the activation engine consumes.

use std::sync::Arc;

use crate::config::Settings;
use crate::infrastructure::di::registry::ProviderFactory;
use crate::infrastructure::traits::{
    InMemoryModuleLoader, LiteralParser, ModuleLoader, NoOptions, OptionSource, PlainTextParser,
    ServiceProviderFactory,
};

/// Container holding the engine's collaborators.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Source of constructible types
    pub loader: Arc<dyn ModuleLoader>,

    /// Declarative literal parser
    pub parser: Arc<dyn LiteralParser>,

    /// Named capability providers
    pub providers: Arc<dyn ServiceProviderFactory>,

    /// Profiles, configurations and settings providers
    pub options: Arc<dyn OptionSource>,
}

impl ServiceContainer {
    /// Create a container with the in-memory default implementations.
    pub fn new(settings: Settings, loader: Arc<dyn ModuleLoader>) -> Self {
        Self::with_deps(
            settings,
            loader,
            Arc::new(PlainTextParser),
            Arc::new(ProviderFactory::default()),
            Arc::new(NoOptions),
        )
    }

    /// Create a container with default settings and an empty module loader.
    pub fn empty() -> Self {
        Self::new(Settings::default(), Arc::new(InMemoryModuleLoader::new()))
    }

    /// Create a container with custom dependencies (for hosts and testing).
    pub fn with_deps(
        settings: Settings,
        loader: Arc<dyn ModuleLoader>,
        parser: Arc<dyn LiteralParser>,
        providers: Arc<dyn ServiceProviderFactory>,
        options: Arc<dyn OptionSource>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            loader,
            parser,
            providers,
            options,
        }
    }
}
