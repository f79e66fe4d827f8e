//! The named tasks of the site build and how they are composed.

use std::path::Path;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::graph::{FailurePolicy, PipelineError, Step};
use crate::html::HtmlTask;
use crate::lint::LintTask;
use crate::scripts::ScriptsTask;
use crate::styles::StylesTask;
use crate::task::Task;
use crate::watcher::WatchRule;

/// Names accepted by [`Tasks::step`].
pub const TASK_NAMES: [&str; 6] = ["scripts", "lint", "styles", "html", "build", "default"];

/// Every task of the build, constructed once from configuration.
pub struct Tasks {
    config: PipelineConfig,
    scripts: Arc<dyn Task>,
    lint: Arc<dyn Task>,
    styles: Arc<dyn Task>,
    html: Arc<dyn Task>,
}

impl Tasks {
    /// `config_path` is handed to the builder process as `GBHWDB_CONFIG`.
    pub fn new(config: PipelineConfig, config_path: &Path) -> Self {
        let scripts = Arc::new(ScriptsTask::new(config.scripts.clone()));
        let lint = Arc::new(LintTask::new(config.scripts.clone(), config.lint.clone()));
        let styles = Arc::new(StylesTask::new(config.styles.clone()));
        let html = Arc::new(
            HtmlTask::new(config.html.clone())
                .env("GBHWDB_CONFIG", config_path.display().to_string()),
        );

        Self {
            config,
            scripts,
            lint,
            styles,
            html,
        }
    }

    pub fn scripts(&self) -> Step {
        Step::Task(Arc::clone(&self.scripts))
    }

    pub fn lint(&self) -> Step {
        Step::Task(Arc::clone(&self.lint))
    }

    pub fn styles(&self) -> Step {
        Step::Task(Arc::clone(&self.styles))
    }

    pub fn html(&self) -> Step {
        Step::Task(Arc::clone(&self.html))
    }

    /// `parallel(series(scripts, html), styles)`
    pub fn build(&self) -> Step {
        Step::parallel(
            [Step::series([self.scripts(), self.html()]), self.styles()],
            FailurePolicy::BestEffort,
        )
    }

    /// Look up a step by name; `default` is an alias of `build`.
    pub fn step(&self, name: &str) -> Option<Step> {
        match name {
            "scripts" => Some(self.scripts()),
            "lint" => Some(self.lint()),
            "styles" => Some(self.styles()),
            "html" => Some(self.html()),
            "build" | "default" => Some(self.build()),
            _ => None,
        }
    }

    /// The rules run by `watch`.
    pub fn watch_rules(&self) -> Result<Vec<WatchRule>, PipelineError> {
        let scripts_src = &self.config.scripts.src;
        let scripts_out = &self.config.scripts.out;
        let styles_src = &self.config.styles.src;

        let scripts = WatchRule::new(
            "scripts",
            &[
                glob_under(scripts_src, "**/*.ts"),
                glob_under(scripts_src, "**/*.tsx"),
            ],
            self.scripts(),
        )?;

        let mut html_patterns = vec![glob_under(scripts_out, "**/*.js")];
        html_patterns.extend(self.config.html.watch.iter().cloned());
        let html = WatchRule::new("html", &html_patterns, self.html())?;

        let styles = WatchRule::new(
            "styles",
            &[glob_under(styles_src, "**/*.scss")],
            self.styles(),
        )?;

        Ok(vec![scripts, html, styles])
    }
}

fn glob_under(dir: &Path, pattern: &str) -> String {
    let dir = dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        pattern.to_string()
    } else {
        format!("{}/{}", glob::Pattern::escape(dir), pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tasks() -> Tasks {
        Tasks::new(PipelineConfig::default(), Path::new("gbhwdb.toml"))
    }

    #[test]
    fn build_graph_shape() {
        let build = tasks().build();

        assert_eq!(build.task_names(), vec!["scripts", "html", "styles"]);
        match build {
            Step::Parallel { steps, policy } => {
                assert_eq!(policy, FailurePolicy::BestEffort);
                assert!(matches!(&steps[0], Step::Series(inner) if inner.len() == 2));
                assert!(matches!(&steps[1], Step::Task(_)));
            }
            other => panic!("expected parallel step, got {other:?}"),
        }
    }

    #[test]
    fn resolves_every_task_name() {
        let tasks = tasks();

        for name in TASK_NAMES {
            assert!(tasks.step(name).is_some(), "{name}");
        }
        assert_eq!(tasks.step("default").unwrap().task_names().len(), 3);
        assert!(tasks.step("deploy").is_none());
    }

    #[test]
    fn watch_rules_route_paths() {
        let rules = tasks().watch_rules().unwrap();
        let route = |path: &str| -> Vec<&str> {
            rules
                .iter()
                .filter(|r| r.matches(Path::new(path)))
                .map(|r| r.name())
                .collect()
        };

        assert_eq!(route("src/site/Site.tsx"), vec!["scripts"]);
        assert_eq!(route("src/config.ts"), vec!["scripts"]);
        assert_eq!(route("build/scripts/site/Site.js"), vec!["html"]);
        assert_eq!(route("content/contribute.markdown"), vec!["html"]);
        assert_eq!(route("data/consoles/dmg/DMG-1/metadata.json"), vec!["html"]);
        assert_eq!(route("data/consoles/dmg/DMG-1/front.jpg"), vec!["html"]);
        assert_eq!(route("src/site/gbhwdb.scss"), vec!["styles"]);
        assert!(route("README.md").is_empty());
    }

    #[test]
    fn glob_under_joins_directory() {
        assert_eq!(glob_under(Path::new("src/site"), "**/*.scss"), "src/site/**/*.scss");
        assert_eq!(glob_under(Path::new("."), "**/*.ts"), "**/*.ts");
    }
}
