//! File watching: re-run a step whenever a matching path changes.

use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use glob::Pattern;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;
use tokio::task::JoinSet;

use crate::graph::{Pipeline, PipelineError, Step};

/// Quiet period after the last event before a rule re-runs.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// A set of glob patterns (relative to the project root) and the step they trigger.
#[derive(Debug, Clone)]
pub struct WatchRule {
    name: String,
    patterns: Vec<Pattern>,
    step: Step,
}

impl WatchRule {
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        patterns: &[S],
        step: Step,
    ) -> Result<Self, PipelineError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| {
                    PipelineError::Watch(format!("invalid pattern {:?}: {}", p.as_ref(), e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            patterns,
            step,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a root-relative path triggers this rule.
    pub fn matches(&self, relative: &Path) -> bool {
        self.patterns.iter().any(|p| p.matches_path(relative))
    }

    /// Directories to watch: for each pattern, the nearest existing ancestor
    /// of its literal prefix.
    pub fn roots(&self, root: &Path) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = Vec::new();
        for pattern in &self.patterns {
            let mut dir = root.join(literal_prefix(pattern.as_str()));
            while !dir.is_dir() && dir != root {
                if !dir.pop() {
                    break;
                }
            }
            if !roots.contains(&dir) {
                roots.push(dir);
            }
        }
        roots
    }
}

/// Leading path components of a pattern that contain no glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| match c {
            Component::Normal(part) => !part
                .to_str()
                .is_some_and(|s| s.contains(['*', '?', '[', '{'])),
            _ => false,
        })
        .collect()
}

/// Raw change notifications for a set of directories.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `paths` recursively; changed paths arrive on the returned channel.
    pub fn new(
        paths: &[PathBuf],
    ) -> Result<(Self, async_mpsc::Receiver<PathBuf>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        for path in paths {
            if path.exists() {
                watcher
                    .watch(path, RecursiveMode::Recursive)
                    .map_err(std::io::Error::other)?;
            }
        }

        std::thread::spawn(move || {
            while let Ok(event) = sync_rx.recv() {
                if event.kind.is_access() {
                    continue;
                }
                for path in event.paths {
                    if async_tx.blocking_send(path).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Run every rule concurrently until a watcher fails.
///
/// A failing re-run is logged; watching continues.
pub async fn watch(root: &Path, rules: Vec<WatchRule>) -> Result<(), PipelineError> {
    let root = root
        .canonicalize()
        .map_err(|e| PipelineError::Watch(format!("{}: {}", root.display(), e)))?;

    let mut set = JoinSet::new();
    for rule in rules {
        let root = root.clone();
        set.spawn(async move { watch_rule(&root, rule).await });
    }

    while let Some(joined) = set.join_next().await {
        joined.map_err(|e| PipelineError::Join(e.to_string()))??;
    }
    Ok(())
}

async fn watch_rule(root: &Path, rule: WatchRule) -> Result<(), PipelineError> {
    let roots = rule.roots(root);
    let (_watcher, mut rx) =
        FileWatcher::new(&roots).map_err(|e| PipelineError::Watch(e.to_string()))?;
    tracing::info!("Watching '{}' ({} roots)", rule.name, roots.len());

    loop {
        let Some(path) = rx.recv().await else {
            return Err(PipelineError::Watch(format!(
                "watcher for '{}' stopped",
                rule.name
            )));
        };
        if !is_match(&rule, root, &path) {
            continue;
        }
        tracing::debug!("'{}' triggered by {}", rule.name, path.display());

        // Absorb the rest of the burst.
        loop {
            match tokio::time::timeout(DEBOUNCE, rx.recv()).await {
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => break,
            }
        }

        if let Err(e) = Pipeline::new(rule.step.clone()).run().await {
            tracing::error!("'{}' failed: {}", rule.name, e);
        }
    }
}

fn is_match(rule: &WatchRule, root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .map(|relative| rule.matches(relative))
        .unwrap_or(false)
}
