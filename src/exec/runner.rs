// src/exec/runner.rs

//! Pluggable command runner.
//!
//! Production code uses [`SystemRunner`]; tests provide a runner that records
//! invocations and returns scripted exit codes.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::errors::{ClusterlabError, Result};
use crate::exec::command::{CommandSpec, OutputMode};

pub type RunFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Runs external programs and reports their exit code.
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and return its exit code (`-1` if it was
    /// terminated by a signal).
    ///
    /// `Err` is reserved for failing to run the program at all.
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a, i32>;

    /// Like [`run`](Self::run), but a non-zero exit is a
    /// [`ClusterlabError::CommandFailure`].
    fn run_checked<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a, ()> {
        Box::pin(async move {
            let code = self.run(spec).await?;
            if code != 0 {
                error!(command = %spec, exit_code = code, "checked command failed");
                return Err(ClusterlabError::CommandFailure {
                    command: spec.to_string(),
                    code,
                });
            }
            Ok(())
        })
    }
}

/// Runner backed by `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run<'a>(&'a self, spec: &'a CommandSpec) -> RunFuture<'a, i32> {
        Box::pin(async move { run_process(spec).await })
    }
}

async fn run_process(spec: &CommandSpec) -> Result<i32> {
    info!(command = %spec, cwd = ?spec.cwd, "running command");

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args).kill_on_drop(true);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    match spec.output {
        OutputMode::Quiet => {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        OutputMode::Log => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
        OutputMode::Forward => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning `{}`", spec))?;

    let readers = [
        child.stdout.take().map(|s| spawn_line_logger(spec.program.clone(), "stdout", s)),
        child.stderr.take().map(|s| spawn_line_logger(spec.program.clone(), "stderr", s)),
    ];

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for `{}`", spec))?;

    // Drain the remaining output so log lines are not interleaved with the
    // next command's.
    for reader in readers.into_iter().flatten() {
        let _ = reader.await;
    }

    let code = status.code().unwrap_or(-1);
    if status.success() {
        debug!(command = %spec, "command exited successfully");
    } else {
        warn!(command = %spec, exit_code = code, "command returned non-zero");
    }
    Ok(code)
}

fn spawn_line_logger<R>(
    program: String,
    stream: &'static str,
    reader: R,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(program = %program, stream, "{}", line);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn reports_exit_codes_and_honours_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();
        let runner = SystemRunner::new();

        let found = CommandSpec::new("test").args(["-f", "marker"]).cwd(dir.path());
        assert_eq!(runner.run(&found).await.unwrap(), 0);

        let missing = CommandSpec::new("test").args(["-f", "nope"]).cwd(dir.path());
        assert_eq!(runner.run(&missing).await.unwrap(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn checked_run_turns_non_zero_into_command_failure() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("sh").args(["-c", "exit 3"]);

        match runner.run_checked(&spec).await {
            Err(ClusterlabError::CommandFailure { command, code }) => {
                assert_eq!(code, 3);
                assert_eq!(command, "sh -c exit 3");
            }
            other => panic!("expected CommandFailure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_an_error_not_an_exit_code() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("definitely-not-a-real-program-xyz");
        assert!(matches!(
            runner.run(&spec).await,
            Err(ClusterlabError::Other(_))
        ));
    }
}
