//! Console navigation shown in the site header.

use serde::Serialize;

use crate::config::{ConfigError, SiteConfig};

/// A navigation entry for one console model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    /// Uppercase model code (e.g. "DMG")
    pub model: String,
    /// Raw model code (e.g. "dmg")
    pub code: String,
    /// Display name
    pub name: String,
    /// Whether the current page belongs to this console
    pub active: bool,
}

#[derive(Debug, Clone)]
struct ConsoleModel {
    model: String,
    code: String,
    name: String,
}

/// Console navigation derived once from the site configuration.
#[derive(Debug, Clone)]
pub struct Navigation {
    models: Vec<ConsoleModel>,
}

impl Navigation {
    /// Build the model list in configuration order.
    pub fn from_config(config: &SiteConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let models = config
            .consoles
            .iter()
            .map(|code| ConsoleModel {
                model: code.to_uppercase(),
                code: code.clone(),
                name: config
                    .console_cfgs
                    .get(code)
                    .map(|cfg| cfg.name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Ok(Self { models })
    }

    /// Navigation entries for a page, with the matching console marked active.
    pub fn compute(&self, page_type: &str) -> Vec<NavEntry> {
        self.models
            .iter()
            .map(|m| NavEntry {
                model: m.model.clone(),
                code: m.code.clone(),
                name: m.name.clone(),
                active: is_model(page_type, &m.code),
            })
            .collect()
    }
}

fn is_model(page_type: &str, code: &str) -> bool {
    page_type == code || page_type.strip_suffix("-console") == Some(code)
}
