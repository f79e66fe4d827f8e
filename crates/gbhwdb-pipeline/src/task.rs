//! Task abstraction and lifecycle states.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;

/// Future returned by [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'a>>;

/// A named unit of work in the build graph.
pub trait Task: Send + Sync {
    /// Task name as used on the command line (e.g. "scripts")
    fn name(&self) -> &str;

    /// Run the task to completion.
    fn run(&self) -> TaskFuture<'_>;
}

/// Lifecycle of a task within one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// Aborted because a fail-fast sibling failed
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Errors that fail a task.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("{count} compile error(s)")]
    Compile { count: usize },

    #[error("{count} lint problem(s)")]
    Lint { count: usize },

    #[error("`{command}` failed: {status}")]
    ProcessExit { command: String, status: ExitStatus },

    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task did not complete: {0}")]
    Join(String),

    #[error("{0}")]
    Other(String),
}
