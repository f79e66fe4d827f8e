//! Write a default configuration file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());
    tracing::info!("Run 'gbhwdb build' to build the site.");

    Ok(())
}

pub const DEFAULT_CONFIG: &str = r#"# gbhwdb configuration

[site]
# Consoles in the header, in display order
consoles = ["dmg", "sgb", "mgb", "mgl", "sgb2", "cgb", "agb", "ags", "gbs", "oxy"]

# Reject unknown page types instead of rendering an empty page
strict_page_types = false

[site.console_cfgs.dmg]
name = "Game Boy"

[site.console_cfgs.sgb]
name = "Super Game Boy"

[site.console_cfgs.mgb]
name = "Game Boy Pocket"

[site.console_cfgs.mgl]
name = "Game Boy Light"

[site.console_cfgs.sgb2]
name = "Super Game Boy 2"

[site.console_cfgs.cgb]
name = "Game Boy Color"

[site.console_cfgs.agb]
name = "Game Boy Advance"

[site.console_cfgs.ags]
name = "Game Boy Advance SP"

[site.console_cfgs.gbs]
name = "Game Boy Player"

[site.console_cfgs.oxy]
name = "Game Boy Micro"

[scripts]
src = "src"
out = "build/scripts"
# Type checker; an empty list skips type checking
check = ["tsc", "--noEmit", "-p", "tsconfig.json"]

[lint]
# Rules to skip, e.g. ["no-var"]
allow = []

[styles]
src = "src/site"
out = "build/site/static"
minify = true

[html]
command = ["gbhwdb-builder"]
watch = ["content/**/*.markdown", "data/**/*.json", "data/**/*.jpg"]

[builder]
data_dir = "data"
content_dir = "content"
static_dir = "static"
output_dir = "build/site"
"#;
