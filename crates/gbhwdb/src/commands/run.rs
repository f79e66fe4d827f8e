//! Run a named task (or the composite build).

use std::path::Path;

use anyhow::Result;
use gbhwdb_pipeline::{Pipeline, TaskState, Tasks};

use crate::config::load_config;

/// Run the command.
pub async fn run(config_path: &Path, name: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let tasks = Tasks::new(config.pipeline, config_path);
    let step = tasks
        .step(name)
        .ok_or_else(|| anyhow::anyhow!("Unknown task: {}", name))?;

    let pipeline = Pipeline::new(step);
    let result = pipeline.run().await;

    for (task, state) in pipeline.report().entries() {
        if state == TaskState::Succeeded {
            tracing::debug!("{}: {}", task, state);
        } else {
            tracing::info!("{}: {}", task, state);
        }
    }

    if let Err(e) = result {
        anyhow::bail!("'{}' failed: {}", name, e);
    }
    Ok(())
}
