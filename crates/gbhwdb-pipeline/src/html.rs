//! The `html` task: runs the site builder as a child process.

use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;

use crate::config::HtmlConfig;
use crate::task::{Task, TaskError, TaskFuture};

/// Spawns the builder command and forwards its output.
pub struct HtmlTask {
    config: HtmlConfig,
    envs: Vec<(String, String)>,
}

impl HtmlTask {
    pub fn new(config: HtmlConfig) -> Self {
        Self {
            config,
            envs: Vec::new(),
        }
    }

    /// Set an environment variable for the builder process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn command_line(&self) -> String {
        self.config.command.join(" ")
    }
}

impl Task for HtmlTask {
    fn name(&self) -> &str {
        "html"
    }

    fn run(&self) -> TaskFuture<'_> {
        Box::pin(async move {
            let Some((program, args)) = self.config.command.split_first() else {
                return Err(TaskError::Other("html.command is empty".to_string()));
            };
            let command = self.command_line();
            tracing::debug!("Spawning `{}`", command);

            let mut child = Command::new(program)
                .args(args)
                .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| TaskError::Spawn {
                    command: command.clone(),
                    source,
                })?;

            let stdout = child.stdout.take();
            let stderr = child.stderr.take();
            let (status, out, err) = tokio::join!(
                child.wait(),
                forward(stdout, tokio::io::stdout()),
                forward(stderr, tokio::io::stderr()),
            );
            out?;
            err?;

            let status = status?;
            if !status.success() {
                return Err(TaskError::ProcessExit { command, status });
            }
            Ok(())
        })
    }
}

async fn forward<R, W>(reader: Option<R>, mut writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(mut reader) = reader {
        tokio::io::copy(&mut reader, &mut writer).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::tempdir;

    use crate::config::ScriptsConfig;
    use crate::graph::{Pipeline, Step};
    use crate::scripts::ScriptsTask;
    use crate::task::TaskState;

    fn sh(script: &str) -> HtmlTask {
        HtmlTask::new(HtmlConfig {
            command: vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            watch: Vec::new(),
        })
    }

    #[tokio::test]
    async fn succeeds_on_zero_exit() {
        assert!(sh("echo building").run().await.is_ok());
    }

    #[tokio::test]
    async fn nonzero_exit_fails() {
        let result = sh("exit 3").run().await;

        match result {
            Err(TaskError::ProcessExit { status, .. }) => assert_eq!(status.code(), Some(3)),
            other => panic!("expected process exit error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let task = HtmlTask::new(HtmlConfig {
            command: vec!["gbhwdb-no-such-builder".to_string()],
            watch: Vec::new(),
        });

        assert!(matches!(task.run().await, Err(TaskError::Spawn { .. })));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let task = HtmlTask::new(HtmlConfig {
            command: Vec::new(),
            watch: Vec::new(),
        });

        assert!(matches!(task.run().await, Err(TaskError::Other(_))));
    }

    /// Run a shell script, forwarding into buffers. Returns (stdout, stderr).
    async fn forwarded(script: &str) -> (Vec<u8>, Vec<u8>) {
        let mut child = Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut out = Vec::new();
        let mut err = Vec::new();
        let (status, o, e) = tokio::join!(
            child.wait(),
            forward(stdout, &mut out),
            forward(stderr, &mut err),
        );
        assert!(status.unwrap().success());
        o.unwrap();
        e.unwrap();

        (out, err)
    }

    #[tokio::test]
    async fn forwards_stdout_verbatim() {
        let (out, err) = forwarded("printf 'Rendering 2 pages\\n\\tdone'").await;

        assert_eq!(out, b"Rendering 2 pages\n\tdone".to_vec());
        assert!(err.is_empty());
    }

    #[tokio::test]
    async fn forwards_stderr_separately() {
        let (out, err) = forwarded("printf out; printf 'warn: missing photo' >&2").await;

        assert_eq!(out, b"out".to_vec());
        assert_eq!(err, b"warn: missing photo".to_vec());
    }

    #[tokio::test]
    async fn closed_stream_forwards_nothing() {
        let mut sink = Vec::new();

        forward(None::<tokio::io::Empty>, &mut sink).await.unwrap();

        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn passes_environment() {
        let temp = tempdir().unwrap();
        let marker = temp.path().join("env.txt");
        let task = sh(&format!("printf %s \"$GBHWDB_CONFIG\" > {}", marker.display()))
            .env("GBHWDB_CONFIG", "site.toml");

        task.run().await.unwrap();

        assert_eq!(std::fs::read_to_string(marker).unwrap(), "site.toml");
    }

    #[tokio::test]
    async fn not_spawned_when_scripts_fail() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("broken.ts"), "let = ;\n").unwrap();
        let marker = temp.path().join("built");

        let scripts = ScriptsTask::new(ScriptsConfig {
            src,
            out: temp.path().join("build/scripts"),
            check: Vec::new(),
        });
        let html = sh(&format!("touch {}", marker.display()));
        let pipeline = Pipeline::new(Step::series([
            Step::Task(Arc::new(scripts)),
            Step::Task(Arc::new(html)),
        ]));

        assert!(pipeline.run().await.is_err());
        assert!(!marker.exists());
        assert_eq!(pipeline.report().state("html"), Some(TaskState::Pending));
    }
}
