//! Plugin records: the declarative source a node or builtin came from.

use std::fmt;
use std::path::{Path, PathBuf};

/// A loaded plugin definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    name: String,
    file_path: PathBuf,
}

impl Plugin {
    pub fn new(name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file_path: file_path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// File name of the definition, used in diagnostics.
    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
