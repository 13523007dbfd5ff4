//! Freshness directive for materializing builtins.

use std::fmt;

/// How a builtin's cached value is trusted when it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObtainMode {
    /// Build once, then reuse the cached value while it is non-empty.
    #[default]
    Auto,
    /// Build on every access, ignoring the cache.
    Always,
    /// Never build; return whatever is cached, possibly nothing.
    Never,
}

impl ObtainMode {
    /// Path-text marker selecting this mode, if any.
    pub fn marker(self) -> Option<char> {
        match self {
            ObtainMode::Auto => None,
            ObtainMode::Always => Some('*'),
            ObtainMode::Never => Some('!'),
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '*' => Some(ObtainMode::Always),
            '!' => Some(ObtainMode::Never),
            _ => None,
        }
    }
}

impl fmt::Display for ObtainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObtainMode::Auto => "Auto",
            ObtainMode::Always => "Always",
            ObtainMode::Never => "Never",
        };
        f.write_str(name)
    }
}
