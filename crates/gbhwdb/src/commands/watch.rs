//! Watch command: re-run tasks as their inputs change.

use std::path::Path;

use anyhow::{Context, Result};
use gbhwdb_pipeline::{watch, Tasks};

use crate::config::load_config;

/// Run the watch command. Only returns on error.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let tasks = Tasks::new(config.pipeline, config_path);
    let rules = tasks.watch_rules()?;

    tracing::info!("Watching for changes (Ctrl+C to stop)");
    watch(Path::new("."), rules)
        .await
        .context("Watch stopped")
}
