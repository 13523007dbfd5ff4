//! Tests for TypeResolver: aliases, loaded modules and module loading

use std::sync::Arc;

use rstest::rstest;

use plugtree::application::{
    ComponentType, Module, ModuleVersion, TypeRef, TypeResolutionError, TypeResolver,
};
use plugtree::domain::{Shape, ValueKind};
use plugtree::infrastructure::{InMemoryModuleLoader, ModuleLoader};

fn resolver_with(loader: &Arc<InMemoryModuleLoader>) -> TypeResolver {
    TypeResolver::new(loader.clone(), "core.")
}

fn element_of(ty: Option<TypeRef>) -> Option<String> {
    ty.and_then(|t| t.as_component().and_then(|c| c.element_type().map(str::to_string)))
}

#[rstest]
#[case("string", ValueKind::Text, Shape::Scalar)]
#[case("Int?", ValueKind::Int, Shape::Nullable)]
#[case("guid[]", ValueKind::Guid, Shape::Array)]
#[case(" Date Time ", ValueKind::DateTime, Shape::Scalar)]
#[case("boolean", ValueKind::Bool, Shape::Scalar)]
fn given_alias_when_resolving_then_primitive(
    #[case] name: &str,
    #[case] kind: ValueKind,
    #[case] shape: Shape,
) {
    let loader = Arc::new(InMemoryModuleLoader::new());
    let resolved = resolver_with(&loader).resolve(name).unwrap();
    assert_eq!(resolved, Some(TypeRef::Primitive(kind, shape)));
}

#[test]
fn given_blank_name_when_resolving_then_none() {
    let loader = Arc::new(InMemoryModuleLoader::new());
    assert_eq!(resolver_with(&loader).resolve("  ").unwrap(), None);
}

#[test]
fn given_loaded_type_when_resolving_by_name_then_found() {
    // Arrange
    let loader = Arc::new(InMemoryModuleLoader::new());
    loader.register(Module::new("Acme").with_type(ComponentType::new("Acme.Widget")));
    let resolver = resolver_with(&loader);

    // Act
    let plain = resolver.resolve("Acme.Widget").unwrap();
    let qualified = resolver.resolve("Acme.Widget, Acme").unwrap();

    // Assert
    assert_eq!(plain.as_ref().map(TypeRef::name).as_deref(), Some("Acme.Widget"));
    assert_eq!(plain, qualified);
}

#[test]
fn given_several_versions_when_resolving_qualified_then_highest_wins() {
    let loader = Arc::new(InMemoryModuleLoader::new());
    for (version, element) in [(1, "one"), (3, "three"), (2, "two")] {
        loader.register(
            Module::new("Acme")
                .with_version(ModuleVersion::new(version, 0, 0, 0))
                .with_type(ComponentType::new("Acme.List").with_element_type(element)),
        );
    }

    let resolved = resolver_with(&loader).resolve("Acme.List, acme").unwrap();

    assert_eq!(element_of(resolved).as_deref(), Some("three"));
}

#[test]
fn given_public_key_token_when_resolving_then_only_matching_module_counts() {
    let loader = Arc::new(InMemoryModuleLoader::new());
    loader.register(
        Module::new("Acme")
            .with_version(ModuleVersion::new(9, 0, 0, 0))
            .with_type(ComponentType::new("Acme.List").with_element_type("unsigned")),
    );
    loader.register(
        Module::new("Acme")
            .with_version(ModuleVersion::new(1, 0, 0, 0))
            .with_public_key_token(vec![0xab, 0xcd])
            .with_type(ComponentType::new("Acme.List").with_element_type("signed")),
    );

    let resolved = resolver_with(&loader)
        .resolve("Acme.List, Acme, PublicKeyToken=ABCD")
        .unwrap();

    assert_eq!(element_of(resolved).as_deref(), Some("signed"));
}

#[test]
fn given_staged_module_when_resolving_qualified_then_loads_it() {
    // Arrange
    let loader = Arc::new(InMemoryModuleLoader::new());
    loader.stage(Module::new("Plugins.Extra").with_type(ComponentType::new("Extra.Thing")));
    let resolver = resolver_with(&loader);
    assert!(resolver.resolve("Extra.Thing").is_err());

    // Act
    let resolved = resolver.resolve("Extra.Thing, Plugins.Extra").unwrap();

    // Assert
    assert!(resolved.is_some());
    assert_eq!(loader.loaded().len(), 1);
    assert!(resolver.resolve("Extra.Thing").unwrap().is_some());
}

#[test]
fn given_standard_prefix_when_resolving_then_uses_standard_loading() {
    let loader = Arc::new(InMemoryModuleLoader::new());
    loader.stage_standard(
        Module::new("core.text").with_type(ComponentType::new("core.text.Encoder")),
    );
    let resolver = resolver_with(&loader);

    assert!(resolver.resolve("core.text.Encoder").unwrap().is_some());
    assert!(resolver
        .resolve("core.text.Encoder, core.text")
        .unwrap()
        .is_some());
}

#[test]
fn given_unknown_module_when_resolving_qualified_then_module_not_found() {
    let loader = Arc::new(InMemoryModuleLoader::new());
    let result = resolver_with(&loader).resolve("Acme.Widget, Missing");
    assert!(matches!(
        result,
        Err(TypeResolutionError::ModuleNotFound { ref module, .. }) if module == "Missing"
    ));
}

#[rstest]
#[case("Acme.Nothing")]
#[case("Acme.Nothing, Acme")]
fn given_unknown_type_when_resolving_then_type_not_found(#[case] name: &str) {
    let loader = Arc::new(InMemoryModuleLoader::new());
    loader.register(Module::new("Acme"));
    let result = resolver_with(&loader).resolve(name);
    assert!(matches!(result, Err(TypeResolutionError::TypeNotFound(_))));
}

#[rstest]
#[case("Acme.Widget, Acme, Version=one")]
#[case(", Acme")]
#[case("Acme.Widget, Acme, PublicKeyToken=xyz")]
fn given_malformed_qualified_name_when_resolving_then_invalid(#[case] name: &str) {
    let loader = Arc::new(InMemoryModuleLoader::new());
    let result = resolver_with(&loader).resolve(name);
    assert!(matches!(result, Err(TypeResolutionError::InvalidTypeName { .. })));
}
