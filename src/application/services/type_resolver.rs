//! Type name resolution: aliases first, then loaded modules.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace};

use crate::application::error::TypeResolutionError;
use crate::application::module::{highest_version, Module, ModuleRef};
use crate::application::types::{ComponentType, TypeRef};
use crate::domain::{Shape, ValueKind};
use crate::infrastructure::traits::ModuleLoader;

/// Short primitive alias, e.g. `int`, `Guid?`, `date time[]`.
///
/// Matching ignores ASCII case and all whitespace.
pub fn alias(name: &str) -> Option<(ValueKind, Shape)> {
    let normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let (base, shape) = if let Some(base) = normalized.strip_suffix("[]") {
        (base, Shape::Array)
    } else if let Some(base) = normalized.strip_suffix('?') {
        (base, Shape::Nullable)
    } else {
        (normalized.as_str(), Shape::Scalar)
    };

    let kind = match base {
        "string" => ValueKind::Text,
        "int" => ValueKind::Int,
        "long" => ValueKind::Long,
        "short" => ValueKind::Short,
        "byte" => ValueKind::Byte,
        "sbyte" => ValueKind::SByte,
        "uint" => ValueKind::UInt,
        "ulong" => ValueKind::ULong,
        "ushort" => ValueKind::UShort,
        "bool" | "boolean" => ValueKind::Bool,
        "money" | "number" | "numeric" | "decimal" => ValueKind::Decimal,
        "float" | "single" => ValueKind::Float,
        "double" => ValueKind::Double,
        "char" => ValueKind::Char,
        "date" | "time" | "datetime" => ValueKind::DateTime,
        "timespan" => ValueKind::TimeSpan,
        "guid" => ValueKind::Guid,
        _ => return None,
    };

    // Text is already nullable.
    if kind == ValueKind::Text && shape == Shape::Nullable {
        return None;
    }
    Some((kind, shape))
}

/// Maps type names to resolved types through a [`ModuleLoader`].
pub struct TypeResolver {
    loader: Arc<dyn ModuleLoader>,
    standard_prefix: String,
}

impl fmt::Debug for TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeResolver")
            .field("standard_prefix", &self.standard_prefix)
            .finish()
    }
}

impl TypeResolver {
    pub fn new(loader: Arc<dyn ModuleLoader>, standard_prefix: impl Into<String>) -> Self {
        Self {
            loader,
            standard_prefix: standard_prefix.into(),
        }
    }

    /// Resolve a type name. Blank names resolve to `None`.
    ///
    /// Accepts aliases, `Namespace.Type` (searched in loaded modules) and
    /// qualified `Namespace.Type, Module[, Version=..][, PublicKeyToken=..]`.
    #[instrument(level = "debug", skip(self))]
    pub fn resolve(&self, name: &str) -> Result<Option<TypeRef>, TypeResolutionError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        if let Some((kind, shape)) = alias(name) {
            trace!("alias {} -> {}", name, kind.name());
            return Ok(Some(TypeRef::Primitive(kind, shape)));
        }

        let component = match name.split_once(',') {
            Some((type_name, module_text)) => {
                let type_name = type_name.trim();
                if type_name.is_empty() {
                    return Err(TypeResolutionError::InvalidTypeName {
                        name: name.to_string(),
                        reason: "missing type name".to_string(),
                    });
                }
                let module_ref = ModuleRef::parse(module_text)?;
                let module = self.resolve_module(&module_ref).ok_or_else(|| {
                    TypeResolutionError::ModuleNotFound {
                        module: module_ref.name().to_string(),
                        type_name: type_name.to_string(),
                    }
                })?;
                module.get_type(type_name)
            }
            None => self.find_loaded(name),
        };

        component
            .map(|ty| Some(TypeRef::Component(ty)))
            .ok_or_else(|| TypeResolutionError::TypeNotFound(name.to_string()))
    }

    /// Resolve a name that must denote a component type.
    pub fn resolve_component(
        &self,
        name: &str,
    ) -> Result<Option<Arc<ComponentType>>, TypeResolutionError> {
        match self.resolve(name)? {
            Some(TypeRef::Component(ty)) => Ok(Some(ty)),
            Some(TypeRef::Primitive(..)) => Err(TypeResolutionError::InvalidTypeName {
                name: name.to_string(),
                reason: "primitive types have no constructors".to_string(),
            }),
            None => Ok(None),
        }
    }

    /// Find a module: the highest-versioned loaded match, else load it.
    #[instrument(level = "debug", skip(self), fields(module = %module.name()))]
    pub fn resolve_module(&self, module: &ModuleRef) -> Option<Arc<Module>> {
        let matches: Vec<_> = self
            .loader
            .loaded()
            .into_iter()
            .filter(|m| module.matches(m))
            .collect();
        if let Some(found) = highest_version(matches) {
            return Some(found);
        }

        debug!("module {} not loaded, loading", module.name());
        if self.is_standard(module.name()) {
            self.loader.load_standard(module.name())
        } else {
            self.loader.load(module)
        }
    }

    fn find_loaded(&self, type_name: &str) -> Option<Arc<ComponentType>> {
        let loaded = self.loader.loaded();
        if let Some(found) = loaded.iter().find_map(|m| m.get_type(type_name)) {
            return Some(found);
        }

        // `core.text.Encoder` lives in standard module `core.text`
        let (namespace, _) = type_name.rsplit_once('.')?;
        if !self.is_standard(namespace) {
            return None;
        }
        self.loader.load_standard(namespace)?.get_type(type_name)
    }

    fn is_standard(&self, module_name: &str) -> bool {
        let prefix = &self.standard_prefix;
        !prefix.is_empty()
            && module_name
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }
}
