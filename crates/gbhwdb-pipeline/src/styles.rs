//! Style compilation: Sass sources to CSS.
//!
//! Compile errors are logged and skipped; they never fail the task.

use std::fs;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use walkdir::WalkDir;

use crate::config::StylesConfig;
use crate::task::{Task, TaskError, TaskFuture};

/// Errors compiling a single stylesheet.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("Sass error: {0}")]
    Sass(String),

    #[error("CSS error: {0}")]
    Css(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// Outcome of a styles run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StylesSummary {
    pub compiled: usize,
    pub failed: usize,
}

/// Compiles every stylesheet into the static output directory.
pub struct StylesTask {
    config: StylesConfig,
}

impl StylesTask {
    pub fn new(config: StylesConfig) -> Self {
        Self { config }
    }
}

impl Task for StylesTask {
    fn name(&self) -> &str {
        "styles"
    }

    fn run(&self) -> TaskFuture<'_> {
        let config = self.config.clone();
        Box::pin(async move {
            let summary = tokio::task::spawn_blocking(move || compile_all(&config))
                .await
                .map_err(|e| TaskError::Join(e.to_string()))?;

            if summary.failed > 0 {
                tracing::warn!(
                    "Compiled {} stylesheets, {} failed",
                    summary.compiled,
                    summary.failed
                );
            } else {
                tracing::info!("Compiled {} stylesheets", summary.compiled);
            }
            Ok(())
        })
    }
}

/// Entry stylesheets below `src`: `.scss` files that are not `_partials`.
fn discover_stylesheets(src: &Path) -> Vec<PathBuf> {
    let mut sheets: Vec<PathBuf> = WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.ends_with(".scss") && !name.starts_with('_')
        })
        .collect();
    sheets.sort();
    sheets
}

/// Compile every stylesheet, logging failures.
pub fn compile_all(config: &StylesConfig) -> StylesSummary {
    let mut summary = StylesSummary::default();

    for path in discover_stylesheets(&config.src) {
        let relative = path.strip_prefix(&config.src).unwrap_or(&path);
        let target = config.out.join(relative).with_extension("css");

        match compile_stylesheet(&path, config.minify).and_then(|css| write_css(&target, &css)) {
            Ok(()) => {
                tracing::debug!("Compiled {} -> {}", path.display(), target.display());
                summary.compiled += 1;
            }
            Err(e) => {
                tracing::error!("{}: {}", path.display(), e);
                summary.failed += 1;
            }
        }
    }

    summary
}

/// Compile one Sass file and post-process the CSS.
pub fn compile_stylesheet(path: &Path, minify: bool) -> Result<String, StyleError> {
    let mut options = grass::Options::default();
    if let Some(dir) = path.parent() {
        options = options.load_path(dir);
    }
    let css = grass::from_path(path, &options).map_err(|e| StyleError::Sass(e.to_string()))?;

    postprocess(&css, &path.display().to_string(), minify)
}

/// Parse the CSS with lightningcss and print it back, optionally minified.
fn postprocess(css: &str, filename: &str, minify: bool) -> Result<String, StyleError> {
    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| StyleError::Css(e.to_string()))?;

    if minify {
        stylesheet
            .minify(MinifyOptions::default())
            .map_err(|e| StyleError::Css(e.to_string()))?;
    }

    let printed = stylesheet
        .to_css(PrinterOptions {
            minify,
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleError::Css(e.to_string()))?;

    Ok(printed.code)
}

fn write_css(target: &Path, css: &str) -> Result<(), StyleError> {
    let write = || -> std::io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(target, css)
    };
    write().map_err(|e| StyleError::Write {
        path: target.to_path_buf(),
        message: e.to_string(),
    })
}
