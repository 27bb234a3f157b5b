//! Promise-style shell command execution.
//!
//! Commands run through `sh -c` so pipelines and quoting behave the way
//! they do interactively. The call suspends until the subprocess exits;
//! there is deliberately no timeout, so a hung subprocess hangs its
//! caller.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

use crate::errors::ExecError;

/// Decides whether an exit code counts as a failure.
pub type ExitCodePolicy = Arc<dyn Fn(i32) -> bool + Send + Sync>;

/// The default policy: any non-zero exit code is a failure.
pub fn non_zero_fails() -> ExitCodePolicy {
    Arc::new(|code| code != 0)
}

/// A policy that never classifies an exit code as failure, for tools that
/// encode findings rather than errors in their exit status (`npm audit`).
pub fn never_fails() -> ExitCodePolicy {
    Arc::new(|_| false)
}

/// Zero plus the listed codes are successes; everything else fails.
pub fn allow_codes(allowed: Vec<i32>) -> ExitCodePolicy {
    Arc::new(move |code| code != 0 && !allowed.contains(&code))
}

/// Options for one shell invocation.
#[derive(Clone)]
pub struct ExecOptions {
    /// Working directory; the current directory when `None`.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
    /// Exit-code classification.
    pub failure_policy: ExitCodePolicy,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            env: Vec::new(),
            failure_policy: non_zero_fails(),
        }
    }
}

/// Run `command` and capture its standard output.
///
/// Fails when the subprocess cannot be launched or when it exits with a
/// code the options' policy classifies as failure; the error then carries
/// the exit code and captured diagnostic text.
pub async fn run_shell(command: &str, options: &ExecOptions) -> Result<String, ExecError> {
    let mut shell = Command::new("sh");
    shell
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &options.cwd {
        shell.current_dir(dir);
    }
    for (name, value) in &options.env {
        shell.env(name, value);
    }

    debug!(%command, cwd = ?options.cwd, "spawning shell command");
    let output = shell.output().await.map_err(|source| ExecError::Launch {
        command: command.to_string(),
        source,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    // A signal-terminated process has no code; -1 keeps it classifiable.
    let code = output.status.code().unwrap_or(-1);
    if (options.failure_policy)(code) {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(ExecError::ExitCode {
            command: command.to_string(),
            code,
            detail,
        });
    }
    Ok(stdout)
}

/// Run `command` and decode its standard output as JSON.
pub async fn run_shell_json<T: DeserializeOwned>(
    command: &str,
    options: &ExecOptions,
) -> anyhow::Result<T> {
    let stdout = run_shell(command, options).await?;
    serde_json::from_str(&stdout)
        .with_context(|| format!("unexpected output from `{command}`"))
}
