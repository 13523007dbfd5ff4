//! Modules: deployable units supplying constructible types.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::application::error::TypeResolutionError;
use crate::application::types::ComponentType;

/// Four-part module version (`major.minor.build.revision`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct ModuleVersion([u32; 4]);

impl ModuleVersion {
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self([major, minor, build, revision])
    }

    /// Parse `a[.b[.c[.d]]]`; missing parts are zero.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = [0u32; 4];
        let mut count = 0;
        for (i, part) in text.trim().split('.').enumerate() {
            if i >= 4 {
                return None;
            }
            parts[i] = part.trim().parse().ok()?;
            count += 1;
        }
        (count > 0).then_some(Self(parts))
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

/// Reference to a module inside a qualified type name:
/// `Name[, Version=a.b.c.d][, PublicKeyToken=hex]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    name: String,
    version: Option<ModuleVersion>,
    public_key_token: Option<Vec<u8>>,
}

impl ModuleRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            public_key_token: None,
        }
    }

    pub fn parse(text: &str) -> Result<Self, TypeResolutionError> {
        let invalid = |reason: &str| TypeResolutionError::InvalidTypeName {
            name: text.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = text.split(',').map(str::trim);
        let name = parts.next().filter(|n| !n.is_empty()).ok_or_else(|| invalid("missing module name"))?;
        let mut module = Self::new(name);

        for part in parts {
            let Some((key, value)) = part.split_once('=') else {
                return Err(invalid("expected key=value"));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "version" => {
                    module.version =
                        Some(ModuleVersion::parse(value).ok_or_else(|| invalid("bad version"))?);
                }
                "publickeytoken" if value.eq_ignore_ascii_case("null") => {}
                "publickeytoken" => {
                    let token = hex::decode(value).map_err(|_| invalid("bad public key token"))?;
                    module.public_key_token = Some(token);
                }
                _ => {}
            }
        }
        Ok(module)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<ModuleVersion> {
        self.version
    }

    pub fn public_key_token(&self) -> Option<&[u8]> {
        self.public_key_token.as_deref()
    }

    /// Name match (case-insensitive) plus public key token when one is given.
    pub fn matches(&self, module: &Module) -> bool {
        if !module.name().eq_ignore_ascii_case(&self.name) {
            return false;
        }
        match self.public_key_token() {
            Some(token) if !token.is_empty() => module.public_key_token() == Some(token),
            _ => true,
        }
    }
}

pub struct Module {
    name: String,
    version: ModuleVersion,
    public_key_token: Option<Vec<u8>>,
    types: IndexMap<String, Arc<ComponentType>>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: ModuleVersion::default(),
            public_key_token: None,
            types: IndexMap::new(),
        }
    }

    pub fn with_version(mut self, version: ModuleVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_public_key_token(mut self, token: Vec<u8>) -> Self {
        self.public_key_token = Some(token);
        self
    }

    /// Register a constructible type under its fully qualified name.
    pub fn with_type(mut self, component_type: ComponentType) -> Self {
        self.types
            .insert(component_type.name().to_string(), Arc::new(component_type));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> ModuleVersion {
        self.version
    }

    pub fn public_key_token(&self) -> Option<&[u8]> {
        self.public_key_token.as_deref()
    }

    pub fn get_type(&self, name: &str) -> Option<Arc<ComponentType>> {
        self.types.get(name).cloned()
    }

    pub fn types(&self) -> impl Iterator<Item = &Arc<ComponentType>> {
        self.types.values()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Pick the highest-versioned module; the first one wins ties.
pub fn highest_version(modules: Vec<Arc<Module>>) -> Option<Arc<Module>> {
    modules.into_iter().reduce(|best, candidate| {
        match candidate.version().cmp(&best.version()) {
            Ordering::Greater => candidate,
            _ => best,
        }
    })
}
