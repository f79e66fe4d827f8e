//! Pipeline configuration (the `[scripts]`, `[lint]`, `[styles]` and `[html]`
//! sections of gbhwdb.toml).

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for every task in the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub lint: LintConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub html: HtmlConfig,
}

/// Script compilation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsConfig {
    /// Source directory scanned for `.ts` / `.tsx` files
    #[serde(default = "default_scripts_src")]
    pub src: PathBuf,

    /// Output directory for compiled JavaScript
    #[serde(default = "default_scripts_out")]
    pub out: PathBuf,

    /// Type-checker command run after transpiling; empty disables the check
    #[serde(default = "default_scripts_check")]
    pub check: Vec<String>,
}

/// Lint settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LintConfig {
    /// Rules to skip (e.g. "no-var")
    #[serde(default)]
    pub allow: Vec<String>,
}

/// Style compilation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesConfig {
    /// Source directory scanned for `.scss` files
    #[serde(default = "default_styles_src")]
    pub src: PathBuf,

    /// Output directory for compiled CSS
    #[serde(default = "default_styles_out")]
    pub out: PathBuf,

    /// Minify the compiled CSS
    #[serde(default = "default_minify")]
    pub minify: bool,
}

/// Builder process settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlConfig {
    /// Program (and optional fixed arguments) of the builder process
    #[serde(default = "default_html_command")]
    pub command: Vec<String>,

    /// Extra glob patterns that re-run the builder in watch mode
    #[serde(default = "default_html_watch")]
    pub watch: Vec<String>,
}

fn default_scripts_src() -> PathBuf {
    PathBuf::from("src")
}
fn default_scripts_out() -> PathBuf {
    PathBuf::from("build/scripts")
}
fn default_scripts_check() -> Vec<String> {
    ["tsc", "--noEmit", "-p", "tsconfig.json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_styles_src() -> PathBuf {
    PathBuf::from("src/site")
}
fn default_styles_out() -> PathBuf {
    PathBuf::from("build/site/static")
}
fn default_minify() -> bool {
    true
}
fn default_html_command() -> Vec<String> {
    vec!["gbhwdb-builder".to_string()]
}
fn default_html_watch() -> Vec<String> {
    vec![
        "content/**/*.markdown".to_string(),
        "data/**/*.json".to_string(),
        "data/**/*.jpg".to_string(),
    ]
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            src: default_scripts_src(),
            out: default_scripts_out(),
            check: default_scripts_check(),
        }
    }
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            src: default_styles_src(),
            out: default_styles_out(),
            minify: default_minify(),
        }
    }
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            command: default_html_command(),
            watch: default_html_watch(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_sections_with_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
[styles]
minify = false

[html]
command = ["node", "build/scripts/builder/builder.js"]
"#,
        )
        .unwrap();

        assert_eq!(config.scripts.src, PathBuf::from("src"));
        assert_eq!(config.scripts.check[0], "tsc");
        assert_eq!(config.styles.src, PathBuf::from("src/site"));
        assert!(!config.styles.minify);
        assert_eq!(config.html.command.len(), 2);
        assert_eq!(config.html.watch.len(), 3);
        assert!(config.lint.allow.is_empty());
    }
}
