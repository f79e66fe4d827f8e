//! gbhwdb-builder - renders every page of the site.
//!
//! Takes no arguments. The configuration file is `gbhwdb.toml` in the working
//! directory unless `GBHWDB_CONFIG` points elsewhere.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use gbhwdb_site::{SiteBuilder, SiteFile, SiteRenderer};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let config_path = env::var_os("GBHWDB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gbhwdb.toml"));

    let file = SiteFile::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let renderer = SiteRenderer::new(file.site).context("Failed to set up the page renderer")?;

    tracing::info!("Generating site");
    let result = SiteBuilder::new(file.builder, renderer).build()?;

    tracing::info!(
        "Built {} pages and copied {} static files in {}ms",
        result.pages,
        result.static_files,
        result.duration_ms
    );
    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
