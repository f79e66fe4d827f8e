//! Sequence/parallel composition of tasks.
//!
//! A [`Step`] is either a single task, a series (each step waits for its
//! predecessor and the first failure stops the series) or a parallel group
//! whose failure handling is chosen explicitly with a [`FailurePolicy`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::task::JoinSet;

use crate::task::{Task, TaskError, TaskState};

/// How a parallel group reacts to a failing branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Let every branch finish; the group fails if any branch failed.
    BestEffort,
    /// Abort the remaining branches on the first failure.
    FailFast,
}

/// A node in the build graph.
#[derive(Clone)]
pub enum Step {
    Task(Arc<dyn Task>),
    Series(Vec<Step>),
    Parallel {
        steps: Vec<Step>,
        policy: FailurePolicy,
    },
}

impl Step {
    pub fn task(task: impl Task + 'static) -> Self {
        Step::Task(Arc::new(task))
    }

    pub fn series(steps: impl IntoIterator<Item = Step>) -> Self {
        Step::Series(steps.into_iter().collect())
    }

    pub fn parallel(steps: impl IntoIterator<Item = Step>, policy: FailurePolicy) -> Self {
        Step::Parallel {
            steps: steps.into_iter().collect(),
            policy,
        }
    }

    /// Names of all tasks in this step, depth first.
    pub fn task_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, names: &mut Vec<String>) {
        match self {
            Step::Task(task) => names.push(task.name().to_string()),
            Step::Series(steps) | Step::Parallel { steps, .. } => {
                for step in steps {
                    step.collect_names(names);
                }
            }
        }
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Task(task) => write!(f, "Task({})", task.name()),
            Step::Series(steps) => f.debug_tuple("Series").field(steps).finish(),
            Step::Parallel { steps, policy } => f
                .debug_struct("Parallel")
                .field("steps", steps)
                .field("policy", policy)
                .finish(),
        }
    }
}

/// Errors produced by running a step.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Task `{task}` failed: {source}")]
    Task {
        task: String,
        #[source]
        source: TaskError,
    },

    #[error("{} parallel branches failed", .0.len())]
    Parallel(Vec<PipelineError>),

    #[error("Task join error: {0}")]
    Join(String),

    #[error("Watch error: {0}")]
    Watch(String),
}

impl PipelineError {
    /// Names of the failed tasks contained in this error.
    pub fn failed_tasks(&self) -> Vec<&str> {
        match self {
            PipelineError::Task { task, .. } => vec![task.as_str()],
            PipelineError::Parallel(errors) => {
                errors.iter().flat_map(|e| e.failed_tasks()).collect()
            }
            PipelineError::Join(_) | PipelineError::Watch(_) => Vec::new(),
        }
    }
}

/// Task states for one run of a step, in graph order.
#[derive(Debug, Default)]
pub struct RunReport {
    states: Mutex<Vec<(String, TaskState)>>,
}

impl RunReport {
    /// A report with every task of `step` pending.
    pub fn for_step(step: &Step) -> Self {
        let states = step
            .task_names()
            .into_iter()
            .map(|name| (name, TaskState::Pending))
            .collect();
        Self {
            states: Mutex::new(states),
        }
    }

    /// Current state of a task, if it is part of the run.
    pub fn state(&self, task: &str) -> Option<TaskState> {
        self.lock()
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, state)| *state)
    }

    /// Snapshot of all task states.
    pub fn entries(&self) -> Vec<(String, TaskState)> {
        self.lock().clone()
    }

    fn set(&self, task: &str, state: TaskState) {
        let mut states = self.lock();
        match states.iter_mut().find(|(name, _)| name == task) {
            Some(entry) => entry.1 = state,
            None => states.push((task.to_string(), state)),
        }
    }

    fn cancel_running(&self, step: &Step) {
        let names = step.task_names();
        for (name, state) in self.lock().iter_mut() {
            if *state == TaskState::Running && names.contains(name) {
                *state = TaskState::Cancelled;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, TaskState)>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A runnable build graph.
pub struct Pipeline {
    root: Step,
    report: Arc<RunReport>,
}

impl Pipeline {
    pub fn new(root: Step) -> Self {
        let report = Arc::new(RunReport::for_step(&root));
        Self { root, report }
    }

    /// The report updated while the pipeline runs.
    pub fn report(&self) -> Arc<RunReport> {
        Arc::clone(&self.report)
    }

    /// Run the whole graph.
    pub async fn run(&self) -> Result<(), PipelineError> {
        execute(self.root.clone(), Arc::clone(&self.report)).await
    }
}

type StepFuture = Pin<Box<dyn Future<Output = Result<(), PipelineError>> + Send>>;

fn execute(step: Step, report: Arc<RunReport>) -> StepFuture {
    Box::pin(async move {
        match step {
            Step::Task(task) => run_task(task, &report).await,
            Step::Series(steps) => {
                for step in steps {
                    execute(step, Arc::clone(&report)).await?;
                }
                Ok(())
            }
            Step::Parallel { steps, policy } => run_parallel(steps, policy, report).await,
        }
    })
}

async fn run_task(task: Arc<dyn Task>, report: &RunReport) -> Result<(), PipelineError> {
    let name = task.name().to_string();
    let start = Instant::now();

    tracing::info!("Starting '{}'...", name);
    report.set(&name, TaskState::Running);

    match task.run().await {
        Ok(()) => {
            report.set(&name, TaskState::Succeeded);
            tracing::info!("Finished '{}' after {}ms", name, start.elapsed().as_millis());
            Ok(())
        }
        Err(source) => {
            report.set(&name, TaskState::Failed);
            tracing::error!(
                "'{}' errored after {}ms: {}",
                name,
                start.elapsed().as_millis(),
                source
            );
            Err(PipelineError::Task { task: name, source })
        }
    }
}

async fn run_parallel(
    steps: Vec<Step>,
    policy: FailurePolicy,
    report: Arc<RunReport>,
) -> Result<(), PipelineError> {
    let mut set = JoinSet::new();
    for step in &steps {
        set.spawn(execute(step.clone(), Arc::clone(&report)));
    }

    let mut failures = Vec::new();
    while let Some(joined) = set.join_next().await {
        let result = joined.unwrap_or_else(|e| Err(PipelineError::Join(e.to_string())));
        let Err(err) = result else {
            continue;
        };

        if policy == FailurePolicy::FailFast {
            set.abort_all();
            while set.join_next().await.is_some() {}
            for step in &steps {
                report.cancel_running(step);
            }
            return Err(err);
        }
        failures.push(err);
    }

    match failures.len() {
        0 => Ok(()),
        1 => Err(failures.remove(0)),
        _ => Err(PipelineError::Parallel(failures)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::task::TaskFuture;

    /// Test task that sleeps, then succeeds or fails.
    struct FakeTask {
        name: &'static str,
        delay_ms: u64,
        fail: bool,
        runs: Arc<AtomicUsize>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Task for FakeTask {
        fn name(&self) -> &str {
            self.name
        }

        fn run(&self) -> TaskFuture<'_> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                self.runs.fetch_add(1, Ordering::SeqCst);
                self.log.lock().unwrap().push(self.name);
                if self.fail {
                    Err(TaskError::Other(format!("{} broke", self.name)))
                } else {
                    Ok(())
                }
            })
        }
    }

    struct Harness {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn task(&self, name: &'static str, delay_ms: u64, fail: bool) -> (Step, Arc<AtomicUsize>) {
            let runs = Arc::new(AtomicUsize::new(0));
            let step = Step::task(FakeTask {
                name,
                delay_ms,
                fail,
                runs: Arc::clone(&runs),
                log: Arc::clone(&self.log),
            });
            (step, runs)
        }

        fn log(&self) -> Vec<&'static str> {
            self.log.lock().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn series_runs_in_order() {
        let h = Harness::new();
        let (a, _) = h.task("a", 30, false);
        let (b, _) = h.task("b", 0, false);

        Pipeline::new(Step::series([a, b])).run().await.unwrap();

        assert_eq!(h.log(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn failed_step_stops_series() {
        let h = Harness::new();
        let (scripts, _) = h.task("scripts", 0, true);
        let (html, html_runs) = h.task("html", 0, false);
        let pipeline = Pipeline::new(Step::series([scripts, html]));

        let err = pipeline.run().await.unwrap_err();

        assert_eq!(err.failed_tasks(), vec!["scripts"]);
        assert_eq!(html_runs.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.report().state("scripts"), Some(TaskState::Failed));
        assert_eq!(pipeline.report().state("html"), Some(TaskState::Pending));
    }

    #[tokio::test]
    async fn best_effort_lets_siblings_finish() {
        let h = Harness::new();
        let (scripts, _) = h.task("scripts", 20, false);
        let (html, html_runs) = h.task("html", 20, false);
        let (styles, _) = h.task("styles", 0, true);
        let pipeline = Pipeline::new(Step::parallel(
            [Step::series([scripts, html]), styles],
            FailurePolicy::BestEffort,
        ));

        let err = pipeline.run().await.unwrap_err();

        assert_eq!(err.failed_tasks(), vec!["styles"]);
        assert_eq!(html_runs.load(Ordering::SeqCst), 1);
        let report = pipeline.report();
        assert_eq!(report.state("scripts"), Some(TaskState::Succeeded));
        assert_eq!(report.state("html"), Some(TaskState::Succeeded));
        assert_eq!(report.state("styles"), Some(TaskState::Failed));
    }

    #[tokio::test]
    async fn best_effort_collects_every_failure() {
        let h = Harness::new();
        let (a, _) = h.task("a", 0, true);
        let (b, _) = h.task("b", 10, true);

        let err = Pipeline::new(Step::parallel([a, b], FailurePolicy::BestEffort))
            .run()
            .await
            .unwrap_err();

        let mut failed = err.failed_tasks();
        failed.sort_unstable();
        assert_eq!(failed, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn fail_fast_cancels_siblings() {
        let h = Harness::new();
        let (slow, slow_runs) = h.task("slow", 5_000, false);
        let (broken, _) = h.task("broken", 0, true);
        let pipeline = Pipeline::new(Step::parallel([slow, broken], FailurePolicy::FailFast));

        let err = pipeline.run().await.unwrap_err();

        assert_eq!(err.failed_tasks(), vec!["broken"]);
        assert_eq!(slow_runs.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.report().state("slow"), Some(TaskState::Cancelled));
    }

    #[tokio::test]
    async fn parallel_success() {
        let h = Harness::new();
        let (a, _) = h.task("a", 10, false);
        let (b, _) = h.task("b", 0, false);
        let pipeline = Pipeline::new(Step::parallel([a, b], FailurePolicy::BestEffort));

        pipeline.run().await.unwrap();

        assert!(pipeline
            .report()
            .entries()
            .iter()
            .all(|(_, state)| *state == TaskState::Succeeded));
    }

    #[test]
    fn lists_task_names_depth_first() {
        let h = Harness::new();
        let (scripts, _) = h.task("scripts", 0, false);
        let (html, _) = h.task("html", 0, false);
        let (styles, _) = h.task("styles", 0, false);
        let build = Step::parallel(
            [Step::series([scripts, html]), styles],
            FailurePolicy::BestEffort,
        );

        assert_eq!(build.task_names(), vec!["scripts", "html", "styles"]);
        assert_eq!(
            RunReport::for_step(&build).state("html"),
            Some(TaskState::Pending)
        );
    }
}
