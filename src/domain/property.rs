//! Declarative (extended) properties of nodes and builtins.
//!
//! Values are kept as raw text until a consumer asks for them with a
//! target type.

use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedProperty {
    name: String,
    raw: String,
}

impl ExtendedProperty {
    pub fn new(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unparsed declarative text.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Ordered, case-insensitive property set.
#[derive(Debug, Clone, Default)]
pub struct PropertyCollection {
    items: IndexMap<String, ExtendedProperty>,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, keeping its original position.
    pub fn set(&mut self, name: impl Into<String>, raw: impl Into<String>) {
        let property = ExtendedProperty::new(name, raw);
        self.items.insert(property.name.to_lowercase(), property);
    }

    pub fn get(&self, name: &str) -> Option<&ExtendedProperty> {
        self.items.get(&name.to_lowercase())
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.get(name).map(ExtendedProperty::raw)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(&name.to_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<ExtendedProperty> {
        self.items.shift_remove(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Properties in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtendedProperty> {
        self.items.values()
    }
}

impl<N: Into<String>, R: Into<String>> FromIterator<(N, R)> for PropertyCollection {
    fn from_iter<I: IntoIterator<Item = (N, R)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (name, raw) in iter {
            properties.set(name, raw);
        }
        properties
    }
}
