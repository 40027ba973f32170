//! Shell command execution for scripts, npm and the release command.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::debug;

use crate::domain::error::{PublishError, Result};

/// Where a child's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Stream to the terminal.
    Inherit,
    /// Capture into [`CommandOutput`].
    Capture,
}

/// Result of a finished shell command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Command line as given to the shell.
    pub command: String,
    /// Process exit code; -1 when terminated by a signal.
    pub exit_code: i32,
    /// Empty when the output was inherited.
    pub stdout: String,
    /// Empty when the output was inherited.
    pub stderr: String,
    /// Wall-clock time from spawn to exit.
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Convert a non-zero exit into [`PublishError::ScriptFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(PublishError::ScriptFailed {
                program: program_name(&self.command),
                code: self.exit_code,
            })
        }
    }
}

/// First whitespace separated token of a command line.
pub fn program_name(command: &str) -> String {
    command
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

fn shell(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

/// Run `command` through the platform shell in `cwd`.
///
/// Only spawn failures are errors here; inspect the exit code or call
/// [`CommandOutput::into_result`].
pub async fn run_shell(command: &str, cwd: &Path, mode: OutputMode) -> Result<CommandOutput> {
    let start = Instant::now();
    debug!(command, cwd = %cwd.display(), ?mode, "running shell command");

    let mut cmd = shell(command);
    cmd.current_dir(cwd).stdin(Stdio::inherit());
    match mode {
        OutputMode::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        OutputMode::Capture => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
    }

    let output = cmd.output().await.map_err(|e| PublishError::SpawnFailed {
        program: program_name(command),
        reason: e.to_string(),
    })?;

    let exit_code = output.status.code().unwrap_or(-1);
    debug!(command, exit_code, "shell command finished");

    Ok(CommandOutput {
        command: command.to_string(),
        exit_code,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Run a user script with inherited output; non-zero exit is an error.
pub async fn run_script(command: &str, cwd: &Path) -> Result<()> {
    run_shell(command, cwd, OutputMode::Inherit)
        .await?
        .into_result()
        .map(|_| ())
}
