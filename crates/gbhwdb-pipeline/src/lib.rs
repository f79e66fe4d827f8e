//! Build pipeline for the gbhwdb site.
//!
//! Tasks (`scripts`, `lint`, `styles`, `html`) are composed into a graph of
//! series and parallel steps, and re-run from file watches.

pub mod config;
pub mod graph;
pub mod html;
pub mod lint;
pub mod scripts;
pub mod styles;
pub mod task;
pub mod tasks;
pub mod watcher;

pub use config::{HtmlConfig, LintConfig, PipelineConfig, ScriptsConfig, StylesConfig};
pub use graph::{FailurePolicy, Pipeline, PipelineError, RunReport, Step};
pub use html::HtmlTask;
pub use lint::{LintReport, LintTask, Violation};
pub use scripts::ScriptsTask;
pub use styles::{StyleError, StylesTask};
pub use task::{Task, TaskError, TaskFuture, TaskState};
pub use tasks::{Tasks, TASK_NAMES};
pub use watcher::{watch, FileWatcher, WatchRule};
