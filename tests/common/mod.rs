//! Shared fixtures: component types, modules and a ready plugin context.
#![allow(dead_code)]

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use plugtree::application::{
    param, Argument, ComponentType, Injectable, Module, ParamType, PluginContext,
};
use plugtree::config::Settings;
use plugtree::domain::{
    ApplicationModule, Component, DomainError, DomainResult, Member, MemberType, Plugin,
    PluginTree, ServiceKey, ServiceProvider, Shape, Value, ValueKind,
};
use plugtree::infrastructure::{
    ApplicationContext, InMemoryModuleLoader, NoOptions, OptionSource, PlainTextParser,
    ProviderFactory, ServiceContainer, ServiceProviderFactory, ServiceRegistry,
};

pub const WIDGET: &str = "Acme.Widget";
pub const PANEL: &str = "Acme.Panel";
pub const SHELL: &str = "Acme.Shell";
pub const GREETER: &str = "Acme.Greeter";
pub const CLOCKED: &str = "Acme.Clocked";
pub const INSPECTOR: &str = "Acme.Inspector";
pub const CLOCK_CONTRACT: &str = "Acme.IClock";

const TEXT: MemberType = MemberType::Value(ValueKind::Text, Shape::Scalar);

// ============================================================
// Widget: name constructor, Color/Size/Kind members
// ============================================================

static WIDGET_MEMBERS: [Member; 4] = [
    Member::new("Name", TEXT),
    Member::new("Color", TEXT),
    Member::new("Size", MemberType::Value(ValueKind::Int, Shape::Scalar)),
    Member::read_only("Kind", TEXT),
];

#[derive(Debug, Default)]
pub struct Widget {
    name: RwLock<String>,
    color: RwLock<String>,
    size: RwLock<i64>,
}

impl Widget {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: RwLock::new(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    pub fn color(&self) -> String {
        self.color.read().clone()
    }

    pub fn size(&self) -> i64 {
        *self.size.read()
    }
}

impl Component for Widget {
    fn type_name(&self) -> &str {
        WIDGET
    }

    fn members(&self) -> &'static [Member] {
        &WIDGET_MEMBERS
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "Name" => Some(Value::from(self.name())),
            "Color" => Some(Value::from(self.color())),
            "Size" => Some(Value::Int(self.size())),
            "Kind" => Some(Value::from("widget")),
            _ => None,
        }
    }

    fn set_member(&self, name: &str, value: Value) -> DomainResult<()> {
        match (name, value) {
            ("Name", Value::Text(s)) => *self.name.write() = s,
            ("Color", Value::Text(s)) => *self.color.write() = s,
            ("Size", Value::Int(n)) => *self.size.write() = n,
            (other, _) => return Err(DomainError::member_not_found(other, WIDGET)),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Widget type counting its constructions.
pub fn widget_type(builds: Arc<AtomicUsize>) -> ComponentType {
    ComponentType::new(WIDGET).with_constructor([param("name", ParamType::text())], move |args| {
        builds.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Widget::named(args.text(0)?)))
    })
}

// ============================================================
// Panel: collection of widgets
// ============================================================

#[derive(Debug, Default)]
pub struct Panel;

impl Component for Panel {
    fn type_name(&self) -> &str {
        PANEL
    }

    fn element_type(&self) -> Option<&str> {
        Some(WIDGET)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn panel_type() -> ComponentType {
    ComponentType::new(PANEL)
        .with_element_type(WIDGET)
        .with_constructor([], |_| Ok(Box::new(Panel)))
}

// ============================================================
// Shell: application module with its own services
// ============================================================

#[derive(Debug)]
pub struct Shell {
    pub services: Arc<ServiceRegistry>,
}

impl Component for Shell {
    fn type_name(&self) -> &str {
        SHELL
    }

    fn as_module(&self) -> Option<&dyn ApplicationModule> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ApplicationModule for Shell {
    fn name(&self) -> &str {
        "Shell"
    }

    fn services(&self) -> Option<Arc<dyn ServiceProvider>> {
        Some(self.services.clone())
    }
}

pub fn shell_type(services: Arc<ServiceRegistry>) -> ComponentType {
    ComponentType::new(SHELL).as_module().with_constructor([], move |_| {
        Ok(Box::new(Shell {
            services: Arc::clone(&services),
        }))
    })
}

// ============================================================
// Greeter: constructors of arity 0..=3, records the one chosen
// ============================================================

static GREETER_MEMBERS: [Member; 2] = [
    Member::read_only("Arity", MemberType::Value(ValueKind::Int, Shape::Scalar)),
    Member::read_only("Greeting", TEXT),
];

#[derive(Debug)]
pub struct Greeter {
    pub arity: usize,
    pub greeting: String,
}

impl Component for Greeter {
    fn type_name(&self) -> &str {
        GREETER
    }

    fn members(&self) -> &'static [Member] {
        &GREETER_MEMBERS
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        match name {
            "Arity" => Some(Value::Int(self.arity as i64)),
            "Greeting" => Some(Value::from(self.greeting.as_str())),
            _ => None,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Only the arity-2 constructor resolves: the arity-3 one wants a plain
/// integer, which nothing in the resolver chain supplies.
pub fn greeter_type() -> ComponentType {
    let greeter = |arity: usize, greeting: String| -> Box<dyn Component> {
        Box::new(Greeter { arity, greeting })
    };

    ComponentType::new(GREETER)
        .with_constructor([], move |_| Ok(greeter(0, "hello".into())))
        .with_constructor([param("name", ParamType::text())], move |args| {
            Ok(greeter(1, format!("hello {}", args.text(0)?)))
        })
        .with_constructor(
            [
                param("name", ParamType::text()),
                param("retries", ParamType::Value(ValueKind::Int, Shape::Scalar)),
                param("node", ParamType::Node),
            ],
            move |_| Ok(greeter(3, "unreachable".into())),
        )
        .with_constructor(
            [param("name", ParamType::text()), param("node", ParamType::Node)],
            move |args| {
                let node = args.node(1)?;
                let path = args
                    .context()
                    .tree()
                    .full_path(node)
                    .unwrap_or_default()
                    .to_string();
                Ok(greeter(2, format!("hello {} at {}", args.text(0)?, path)))
            },
        )
}

// ============================================================
// Clocked: one injectable member resolved by contract
// ============================================================

static CLOCKED_MEMBERS: [Member; 1] = [Member::new("Clock", MemberType::Named(CLOCK_CONTRACT))];

#[derive(Debug, Default)]
pub struct Clocked {
    clock: RwLock<Option<Value>>,
}

impl Clocked {
    pub fn clock(&self) -> Option<Value> {
        self.clock.read().clone()
    }
}

impl Component for Clocked {
    fn type_name(&self) -> &str {
        CLOCKED
    }

    fn members(&self) -> &'static [Member] {
        &CLOCKED_MEMBERS
    }

    fn get_member(&self, name: &str) -> Option<Value> {
        (name == "Clock").then(|| self.clock().unwrap_or(Value::Null))
    }

    fn set_member(&self, name: &str, value: Value) -> DomainResult<()> {
        if name != "Clock" {
            return Err(DomainError::member_not_found(name, CLOCKED));
        }
        *self.clock.write() = Some(value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn clocked_type(injectable: Injectable) -> ComponentType {
    ComponentType::new(CLOCKED)
        .with_injectable(injectable)
        .with_constructor([], |_| Ok(Box::new(Clocked::default())))
}

// ============================================================
// Inspector: one constructor taking every context parameter kind
// ============================================================

/// Records what each context parameter resolved to. `arity` is 0 when
/// the fallback constructor was chosen.
#[derive(Debug, Default)]
pub struct Inspector {
    pub arity: usize,
    pub builtin: String,
    pub service_clock: Option<Value>,
    pub has_timing_scope: bool,
    pub application: String,
    pub module: Option<String>,
    pub plugin: Option<String>,
    pub saw_context: bool,
    pub profile: Value,
    pub configuration: Value,
    pub options: Value,
    pub settings_provider: Value,
}

impl Component for Inspector {
    fn type_name(&self) -> &str {
        INSPECTOR
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn inspector_type() -> ComponentType {
    ComponentType::new(INSPECTOR)
        .with_constructor([], |_| Ok(Box::new(Inspector::default())))
        .with_constructor(
            [
                param("builtin", ParamType::Builtin),
                param("services", ParamType::Services),
                param("factory", ParamType::ServiceFactory),
                param("application", ParamType::Application),
                param("module", ParamType::Module),
                param("plugin", ParamType::Plugin),
                param("context", ParamType::Context),
                param("profile", ParamType::Profile),
                param("configuration", ParamType::Configuration),
                param("options", ParamType::Options),
                param("settings", ParamType::SettingsProvider),
            ],
            |args| {
                Ok(Box::new(Inspector {
                    arity: args.len(),
                    builtin: args.builtin(0)?.name().to_string(),
                    service_clock: args
                        .services(1)?
                        .resolve(ServiceKey::Contract(CLOCK_CONTRACT)),
                    has_timing_scope: args.factory(2)?.get_provider("Timing").is_some(),
                    application: args.application(3)?.application_id().to_string(),
                    module: args.module(4)?.map(|m| m.type_name().to_string()),
                    plugin: args.plugin(5)?.map(|p| p.name().to_string()),
                    saw_context: matches!(args.get(6), Some(Argument::Context)),
                    profile: args.value(7)?.clone(),
                    configuration: args.value(8)?.clone(),
                    options: args.value(9)?.clone(),
                    settings_provider: args.value(10)?.clone(),
                }))
            },
        )
}

/// Profiles and configurations keyed by plugin name; no settings provider.
#[derive(Debug, Default)]
pub struct PluginOptions;

impl OptionSource for PluginOptions {
    fn profile(&self, plugin: Option<&Plugin>) -> Option<Value> {
        plugin.map(|p| Value::from(format!("profile:{}", p.name())))
    }

    fn configuration(&self, plugin: Option<&Plugin>) -> Option<Value> {
        plugin.map(|p| Value::from(format!("configuration:{}", p.name())))
    }

    fn settings_provider(&self, _plugin: Option<&Plugin>) -> Option<Value> {
        None
    }
}

// ============================================================
// Host application and context
// ============================================================

#[derive(Debug)]
pub struct TestApplication {
    services: Arc<ServiceRegistry>,
    options: Option<Value>,
}

impl ApplicationContext for TestApplication {
    fn application_id(&self) -> &str {
        "plugtree-tests"
    }

    fn services(&self) -> Arc<dyn ServiceProvider> {
        self.services.clone()
    }

    fn options(&self) -> Option<Value> {
        self.options.clone()
    }
}

pub struct Fixture {
    pub ctx: PluginContext,
    pub loader: Arc<InMemoryModuleLoader>,
    pub app_services: Arc<ServiceRegistry>,
    pub widget_builds: Arc<AtomicUsize>,
}

impl Fixture {
    pub fn widget_builds(&self) -> usize {
        self.widget_builds.load(Ordering::SeqCst)
    }
}

/// Context over an empty tree with the `Acme` module loaded.
pub fn fixture() -> Fixture {
    fixture_with(Settings::default(), |module| module)
}

/// Like [`fixture`], with custom settings and extra types on the module.
pub fn fixture_with(settings: Settings, extend: impl FnOnce(Module) -> Module) -> Fixture {
    fixture_full(settings, Arc::new(ProviderFactory::default()), extend)
}

/// Like [`fixture_with`], with an explicit scoped-provider registry.
pub fn fixture_full(
    settings: Settings,
    providers: Arc<ProviderFactory>,
    extend: impl FnOnce(Module) -> Module,
) -> Fixture {
    build_fixture(settings, providers, Arc::new(NoOptions), None, extend)
}

/// Default settings and providers, with plugin options and application
/// options supplied.
pub fn fixture_with_options(
    options: Arc<dyn OptionSource>,
    application_options: Option<Value>,
    extend: impl FnOnce(Module) -> Module,
) -> Fixture {
    build_fixture(
        Settings::default(),
        Arc::new(ProviderFactory::default()),
        options,
        application_options,
        extend,
    )
}

fn build_fixture(
    settings: Settings,
    providers: Arc<ProviderFactory>,
    options: Arc<dyn OptionSource>,
    application_options: Option<Value>,
    extend: impl FnOnce(Module) -> Module,
) -> Fixture {
    plugtree::util::testing::init_test_setup();

    let widget_builds = Arc::new(AtomicUsize::new(0));
    let module = Module::new("Acme")
        .with_type(widget_type(Arc::clone(&widget_builds)))
        .with_type(panel_type())
        .with_type(greeter_type())
        .with_type(inspector_type());

    let loader = Arc::new(InMemoryModuleLoader::new());
    loader.register(extend(module));

    let app_services = Arc::new(ServiceRegistry::new());
    let container = ServiceContainer::with_deps(
        settings,
        loader.clone(),
        Arc::new(PlainTextParser),
        providers,
        options,
    );
    let application = Arc::new(TestApplication {
        services: Arc::clone(&app_services),
        options: application_options,
    });

    Fixture {
        ctx: PluginContext::new(PluginTree::new(), container, application),
        loader,
        app_services,
        widget_builds,
    }
}
