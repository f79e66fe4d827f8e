//! gbhwdb.toml as seen by the CLI.

use std::path::Path;

use anyhow::Result;
use gbhwdb_pipeline::PipelineConfig;
use gbhwdb_site::{load_toml, SiteFile};
use serde::Deserialize;

/// Every section of gbhwdb.toml.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub site: SiteFile,

    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

/// Load configuration if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let config: ConfigFile = load_toml(path)?;
    config.site.site.validate()?;
    Ok(config)
}
