//! Site configuration (the `[site]` and `[builder]` sections of gbhwdb.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::builder::BuildConfig;
use crate::page::Console;

/// Display configuration for a single console model.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConsoleCfg {
    /// Human readable console name (e.g. "Game Boy Pocket")
    pub name: String,
}

/// Site-wide rendering configuration.
///
/// Loaded once at process start and handed to the renderer; nothing reads it
/// through global state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Console codes in navigation display order
    pub consoles: Vec<String>,

    /// Per-console display configuration, keyed by console code
    pub console_cfgs: BTreeMap<String, ConsoleCfg>,

    /// Fail rendering on unknown page types instead of emitting an empty page
    pub strict_page_types: bool,

    /// Google Analytics property id used by the inline bootstrap snippet
    pub analytics_id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            consoles: Console::ALL.iter().map(|c| c.code().to_string()).collect(),
            console_cfgs: Console::ALL
                .iter()
                .map(|c| {
                    (
                        c.code().to_string(),
                        ConsoleCfg {
                            name: c.default_name().to_string(),
                        },
                    )
                })
                .collect(),
            strict_page_types: false,
            analytics_id: "UA-37123121-2".to_string(),
        }
    }
}

impl SiteConfig {
    /// Check that every listed console has a display configuration and is
    /// listed only once, and that the analytics id is safe to inline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analytics_id.is_empty()
            || !self
                .analytics_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::InvalidAnalyticsId(self.analytics_id.clone()));
        }
        for (i, code) in self.consoles.iter().enumerate() {
            if self.consoles[..i].contains(code) {
                return Err(ConfigError::DuplicateConsole(code.clone()));
            }
            if !self.console_cfgs.contains_key(code) {
                return Err(ConfigError::MissingConsoleConfig(code.clone()));
            }
        }
        Ok(())
    }

    /// Display name of a console, falling back to the built-in name.
    pub fn console_name(&self, console: Console) -> &str {
        self.console_cfgs
            .get(console.code())
            .map(|cfg| cfg.name.as_str())
            .unwrap_or_else(|| console.default_name())
    }
}

/// The parts of gbhwdb.toml read by the builder process.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteFile {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub builder: BuildConfig,
}

impl SiteFile {
    /// Load the configuration file if it exists.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file: SiteFile = load_toml(path)?;
        file.site.validate()?;
        Ok(file)
    }
}

/// Read any view of gbhwdb.toml.
///
/// A missing file yields `T::default()`; the caller validates the result.
pub fn load_toml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let value = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::debug!("Loaded config from {}", path.display());
    Ok(value)
}

/// Errors in the site configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Console `{0}` is listed but has no entry in console_cfgs")]
    MissingConsoleConfig(String),

    #[error("Console `{0}` is listed more than once")]
    DuplicateConsole(String),

    #[error("Analytics id `{0}` may only contain ASCII letters, digits and '-'")]
    InvalidAnalyticsId(String),
}
