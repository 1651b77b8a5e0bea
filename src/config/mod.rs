//! User configuration: data-service access, host file location, the change
//! specification and transform presets.
//!
//! Loaded from `$XDG_CONFIG_HOME/invsync/config.toml` (or
//! `~/.config/invsync/config.toml`) unless a path is given. A missing file
//! yields defaults. `INVSYNC_TOKEN` and `INVSYNC_API_URL` override the file.
pub mod toml_loader;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::document::{self, Document, Mapping};
use crate::engine::ChangeSpec;
use crate::error::{ConfigError, SyncError};
use crate::logging::xdg_dir;
use crate::transforms::PluginRegistry;

/// Data-service base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "https://netbox/api";

/// Environment variable overriding [`Config::token`].
pub const TOKEN_ENV: &str = "INVSYNC_TOKEN";

/// Environment variable overriding [`Config::api_url`].
pub const API_URL_ENV: &str = "INVSYNC_API_URL";

/// A config-declared transform preset.
///
/// ```toml
/// [transforms.short_name]
/// base = "replace"
/// search = "\\.example\\.com$"
/// replacement = ""
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PresetConfig {
    /// Registered name of the transform the preset forwards to.
    pub base: String,
    /// Default parameters; call-site parameters override them.
    #[serde(flatten)]
    pub defaults: Mapping,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Data-service base URL.
    pub api_url: Option<String>,
    /// Data-service API token.
    pub token: Option<String>,
    /// Domain suffix appended to device names.
    pub suffix: Option<String>,
    /// Directory containing `host_vars/`.
    pub ansible_directory: Option<PathBuf>,
    /// Path to a change specification document.
    pub change_spec: Option<PathBuf>,
    /// Inline change specification, used when `change_spec` is unset.
    pub changes: Option<Mapping>,
    /// Transform presets keyed by the name they register under.
    pub transforms: BTreeMap<String, PresetConfig>,
}

impl Config {
    /// Default config file location.
    #[must_use]
    pub fn default_path() -> PathBuf {
        xdg_dir("XDG_CONFIG_HOME", ".config")
            .join("invsync")
            .join("config.toml")
    }

    /// Load the config from `path` (or [`default_path`](Self::default_path))
    /// and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        tracing::debug!("loading config from {}", path.display());
        let mut config: Self = toml_loader::load_config(&path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Override settings from environment variables looked up via `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV) {
            self.token = Some(token);
        }
        if let Some(url) = lookup(API_URL_ENV) {
            self.api_url = Some(url);
        }
    }

    /// Data-service base URL, without a trailing slash.
    #[must_use]
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
    }

    /// The API token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] if no token is configured.
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingSetting("token".to_string()))
    }

    /// The ansible directory, preferring `overridden` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSetting`] if neither is set.
    pub fn ansible_directory<'a>(&'a self, overridden: Option<&'a Path>) -> Result<&'a Path, ConfigError> {
        overridden
            .or(self.ansible_directory.as_deref())
            .ok_or_else(|| ConfigError::MissingSetting("ansible_directory".to_string()))
    }

    /// Load and parse the change specification.
    ///
    /// `overridden` takes precedence over `change_spec`, which takes
    /// precedence over the inline `[changes]` table.
    ///
    /// # Errors
    ///
    /// Returns an error if no specification is configured, the file cannot
    /// be loaded, or the specification is malformed.
    pub fn change_spec(&self, overridden: Option<&Path>) -> Result<ChangeSpec, SyncError> {
        let value = match (overridden, self.change_spec.as_deref(), &self.changes) {
            (Some(path), _, _) | (None, Some(path), _) => document::io::load(path)?,
            (None, None, Some(inline)) => Document::Object(inline.clone()),
            (None, None, None) => {
                return Err(ConfigError::MissingSetting("change_spec".to_string()).into());
            }
        };
        Ok(ChangeSpec::parse(&value)?)
    }

    /// Build the plugin registry: the built-in transforms plus every preset.
    ///
    /// Presets may use other presets as their base, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPreset`] for a preset whose base is not
    /// registered (including cycles between presets).
    pub fn registry(&self) -> Result<PluginRegistry, ConfigError> {
        let mut registry = PluginRegistry::with_builtins();
        let mut pending: Vec<(&String, &PresetConfig)> = self.transforms.iter().collect();

        while !pending.is_empty() {
            let (ready, blocked): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|(_, preset)| registry.contains(&preset.base));
            if let Some((name, preset)) = blocked.first().filter(|_| ready.is_empty()) {
                return Err(ConfigError::InvalidPreset {
                    name: (*name).clone(),
                    reason: format!("base transform '{}' is not registered", preset.base),
                });
            }
            for (name, preset) in ready {
                registry.register_preset(name, &preset.base, preset.defaults.clone())?;
            }
            pending = blocked;
        }
        Ok(registry)
    }
}
