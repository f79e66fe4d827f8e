//! Static page builder.
//!
//! Walks the page manifests under the data directory, renders each one with
//! the [`SiteRenderer`] and writes the resulting documents into the output
//! directory. Static files are copied verbatim.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::renderer::{SiteProps, SiteRenderer};

/// Configuration for the builder process.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Data directory (page manifests and submission metadata)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Markdown content directory
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Static files copied as-is into the output directory
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Output directory for rendered pages
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("build/site")
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            content_dir: default_content_dir(),
            static_dir: default_static_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Number of static files copied
    pub static_files: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read {0}")]
    ReadError(String),

    #[error("Invalid page manifest {path}: {message}")]
    ManifestError { path: String, message: String },

    #[error("Failed to render {path}: {message}")]
    RenderError { path: String, message: String },

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Submission totals shown in the site footer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    pub consoles: u32,
    pub cartridges: u32,
}

/// A page manifest (`data/pages/**/*.json`).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageManifest {
    /// Output path relative to the output directory
    path: String,
    page_type: String,
    title: String,
    #[serde(default)]
    page_props: Value,
    /// Markdown file (relative to the content directory) rendered into
    /// `pageProps.content_html`
    #[serde(default)]
    content: Option<String>,
}

/// A page to be built.
#[derive(Debug)]
struct PageInfo {
    source_path: PathBuf,
    output_path: PathBuf,
    manifest: PageManifest,
}

/// Static page builder.
pub struct SiteBuilder {
    config: BuildConfig,
    renderer: SiteRenderer,
}

impl SiteBuilder {
    /// Create a new builder.
    pub fn new(config: BuildConfig, renderer: SiteRenderer) -> Self {
        Self { config, renderer }
    }

    /// Build every page and copy the static files.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        fs::create_dir_all(&self.config.output_dir)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let pages = self.discover_pages()?;
        let counts = self.count_submissions();
        tracing::info!(
            "Rendering {} pages ({} console and {} cartridge submissions)",
            pages.len(),
            counts.consoles,
            counts.cartridges
        );

        pages
            .par_iter()
            .map(|page| self.build_page(page, counts))
            .collect::<Result<Vec<()>, BuildError>>()?;

        let static_files = self.copy_static_files()?;

        Ok(BuildResult {
            pages: pages.len(),
            static_files,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Find and parse all page manifests, sorted by output path.
    fn discover_pages(&self) -> Result<Vec<PageInfo>, BuildError> {
        let pages_dir = self.config.data_dir.join("pages");
        if !pages_dir.exists() {
            tracing::warn!("No page manifests found in {}", pages_dir.display());
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in WalkDir::new(&pages_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let source = fs::read_to_string(path)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;
            let manifest: PageManifest =
                serde_json::from_str(&source).map_err(|e| BuildError::ManifestError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            let output_path = self.output_path(&manifest.path).ok_or_else(|| {
                BuildError::ManifestError {
                    path: path.display().to_string(),
                    message: format!("output path `{}` escapes the output directory", manifest.path),
                }
            })?;

            pages.push(PageInfo {
                source_path: path.to_path_buf(),
                output_path,
                manifest,
            });
        }

        pages.sort_by(|a, b| a.output_path.cmp(&b.output_path));
        Ok(pages)
    }

    /// Map a manifest path to an output file.
    ///
    /// `consoles/dmg/`, `""` and `"."` gain `index.html`, extensionless paths
    /// gain `.html`. Paths with `..` or a root are rejected.
    fn output_path(&self, path: &str) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }

        let target = self.config.output_dir.join(&relative);
        if relative.as_os_str().is_empty() || path.ends_with('/') {
            Some(target.join("index.html"))
        } else if relative.extension().is_none() {
            Some(target.with_extension("html"))
        } else {
            Some(target)
        }
    }

    /// Count `metadata.json` files per submission kind.
    fn count_submissions(&self) -> SubmissionCounts {
        let count = |dir: PathBuf| -> u32 {
            WalkDir::new(dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && e.file_name() == "metadata.json")
                .count() as u32
        };

        SubmissionCounts {
            consoles: count(self.config.data_dir.join("consoles")),
            cartridges: count(self.config.data_dir.join("cartridges")),
        }
    }

    /// Render a single page and write it.
    fn build_page(&self, page: &PageInfo, counts: SubmissionCounts) -> Result<(), BuildError> {
        let mut page_props = page.manifest.page_props.clone();

        if let Some(content) = &page.manifest.content {
            let path = self.config.content_dir.join(content);
            let markdown = fs::read_to_string(&path)
                .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

            if page_props.is_null() {
                page_props = Value::Object(serde_json::Map::new());
            }
            match page_props.as_object_mut() {
                Some(map) => {
                    map.insert("content_html".to_string(), Value::String(render_markdown(&markdown)));
                }
                None => tracing::warn!(
                    "Ignoring content for {}: pageProps is not an object",
                    page.source_path.display()
                ),
            }
        }

        let props = SiteProps {
            page_type: page.manifest.page_type.clone(),
            title: page.manifest.title.clone(),
            page_props,
            console_submission_count: counts.consoles,
            cartridge_submission_count: counts.cartridges,
        };

        let html = self
            .renderer
            .render_site(&props)
            .map_err(|e| BuildError::RenderError {
                path: page.source_path.display().to_string(),
                message: e.to_string(),
            })?;

        if let Some(parent) = page.output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
        }
        fs::write(&page.output_path, html).map_err(|e| BuildError::WriteError(e.to_string()))?;

        tracing::debug!("Wrote {}", page.output_path.display());
        Ok(())
    }

    /// Copy everything under the static directory into the output directory.
    fn copy_static_files(&self) -> Result<usize, BuildError> {
        let static_dir = &self.config.static_dir;
        if !static_dir.exists() {
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let relative = entry.path().strip_prefix(static_dir).unwrap_or(entry.path());
            let target = self.config.output_dir.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| BuildError::WriteError(e.to_string()))?;
            copied += 1;
        }

        tracing::info!("Copied {} static files from {}", copied, static_dir.display());
        Ok(copied)
    }
}

/// Render markdown content to HTML.
fn render_markdown(content: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH;

    let parser = Parser::new_ext(content, options);

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);

    html_output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::tempdir;

    fn builder(root: &Path) -> SiteBuilder {
        let config = BuildConfig {
            data_dir: root.join("data"),
            content_dir: root.join("content"),
            static_dir: root.join("static"),
            output_dir: root.join("out"),
        };
        SiteBuilder::new(config, SiteRenderer::new(SiteConfig::default()).unwrap())
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn builds_pages_from_manifests() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(
            &root.join("data/pages/game.json"),
            r#"{ "path": "cartridges/tetris", "pageType": "game", "title": "Tetris", "pageProps": { "title": "Tetris" } }"#,
        );
        write(
            &root.join("data/pages/consoles/dmg.json"),
            r#"{ "path": "consoles/dmg/", "pageType": "dmg-console", "title": "DMG" }"#,
        );
        write(&root.join("data/consoles/dmg/G01/metadata.json"), "{}");
        write(&root.join("data/consoles/dmg/G02/metadata.json"), "{}");
        write(&root.join("data/cartridges/DMG-TRA/metadata.json"), "{}");

        let result = builder(root).build().unwrap();

        assert_eq!(result.pages, 2);
        let game = fs::read_to_string(root.join("out/cartridges/tetris.html")).unwrap();
        assert!(game.contains("Console submissions: <strong>2</strong>"));
        assert!(game.contains("Cartridge submissions: <strong>1</strong>"));
        assert!(root.join("out/consoles/dmg/index.html").exists());
    }

    #[test]
    fn injects_markdown_content() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(
            &root.join("data/pages/cartridges.json"),
            r#"{ "path": "cartridges/index.html", "pageType": "cartridges", "title": "Cartridges", "content": "cartridges.markdown" }"#,
        );
        write(&root.join("content/cartridges.markdown"), "Cartridge **intro**");

        builder(root).build().unwrap();

        let html = fs::read_to_string(root.join("out/cartridges/index.html")).unwrap();
        assert!(html.contains("<strong>intro</strong>"));
    }

    #[test]
    fn rejects_escaping_output_path() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(
            &root.join("data/pages/evil.json"),
            r#"{ "path": "../evil.html", "pageType": "game", "title": "x" }"#,
        );

        let result = builder(root).build();

        assert!(matches!(result, Err(BuildError::ManifestError { .. })));
    }

    #[test]
    fn current_dir_path_stays_inside_output() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(
            &root.join("data/pages/home.json"),
            r#"{ "path": ".", "pageType": "cartridges", "title": "Home" }"#,
        );

        builder(root).build().unwrap();

        assert!(root.join("out/index.html").exists());
        assert!(!root.join("out.html").exists());
    }

    #[test]
    fn copies_static_files() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        write(&root.join("static/robots.txt"), "User-agent: *");
        write(&root.join("static/images/logo.svg"), "<svg/>");

        let result = builder(root).build().unwrap();

        assert_eq!(result.static_files, 2);
        assert!(root.join("out/images/logo.svg").exists());
    }

    #[test]
    fn maps_output_paths() {
        let temp = tempdir().unwrap();
        let b = builder(temp.path());
        let out = temp.path().join("out");

        assert_eq!(b.output_path(""), Some(out.join("index.html")));
        assert_eq!(b.output_path("/mappers/mbc1"), Some(out.join("mappers/mbc1.html")));
        assert_eq!(b.output_path("site.webmanifest"), Some(out.join("site.webmanifest")));
        assert_eq!(b.output_path("a/../../b"), None);
        assert_eq!(b.output_path("."), Some(out.join("index.html")));
        assert_eq!(b.output_path("./"), Some(out.join("index.html")));
        assert_eq!(b.output_path("./mappers/./mbc5"), Some(out.join("mappers/mbc5.html")));
    }
}
