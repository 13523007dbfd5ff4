//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/plugtree/plugtree.toml`
//! 3. Local config: `<app_dir>/.plugtree.toml`
//! 4. Environment variables: `PLUGTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Tree path of the workbench node
    pub workbench_path: String,
    /// Module names with this prefix use standard (platform) loading
    pub standard_module_prefix: String,
    /// Match member names exactly instead of ignoring ASCII case
    pub case_sensitive_members: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbench_path: "/Workbench".into(),
            standard_module_prefix: "core.".into(),
            case_sensitive_members: false,
        }
    }
}

/// Get the XDG config directory for plugtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "plugtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("plugtree.toml"))
}

/// Get the path to the local config file in an application directory.
pub fn local_config_path(app_dir: &Path) -> PathBuf {
    app_dir.join(".plugtree.toml")
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `app_dir` - Optional application directory holding `.plugtree.toml`
    pub fn load(app_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let local = app_dir.map(local_config_path);
        Self::load_from(global_config_path().as_deref(), local.as_deref(), true)
    }

    /// Load from explicit file locations.
    ///
    /// Missing files are skipped. `with_env` adds the `PLUGTREE_*` layer.
    pub fn load_from(
        global: Option<&Path>,
        local: Option<&Path>,
        with_env: bool,
    ) -> Result<Self, ApplicationError> {
        let mut builder = Self::defaults_builder()?;

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                debug!("config layer: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        if with_env {
            builder = builder.add_source(Environment::with_prefix("PLUGTREE").separator("__"));
        }

        let config = builder.build().map_err(config_err)?;
        config.try_deserialize().map_err(config_err)
    }

    fn defaults_builder() -> Result<ConfigBuilder<DefaultState>, ApplicationError> {
        let defaults = Settings::default();
        Config::builder()
            .set_default("workbench_path", defaults.workbench_path)
            .map_err(config_err)?
            .set_default("standard_module_prefix", defaults.standard_module_prefix)
            .map_err(config_err)?
            .set_default("case_sensitive_members", defaults.case_sensitive_members)
            .map_err(config_err)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# plugtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/plugtree/plugtree.toml
#   Local:  <app_dir>/.plugtree.toml
#   Env:    PLUGTREE_* environment variables

# Tree path resolved by PluginContext::workbench()
# workbench_path = "/Workbench"

# Module names with this prefix fall back to standard loading
# standard_module_prefix = "core."

# Member lookup for declared properties and path member chains
# case_sensitive_members = false
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
