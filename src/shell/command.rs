//! Shell command execution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::{LaunchError, Result};

use super::platform::{shell_flag, shell_program};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Last non-empty line of stdout, trimmed.
    pub fn last_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
    }

    /// Turn a non-zero exit into [`LaunchError::CommandFailed`].
    pub fn check(self, command: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(LaunchError::CommandFailed {
                command: command.to_string(),
                code: self.exit_code,
            })
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Timeout in seconds (None = no timeout).
    pub timeout: Option<u64>,
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Callback for streaming output.
pub type OutputCallback = Arc<dyn Fn(OutputLine) + Send + Sync>;

/// Execute a shell command, capturing its output.
pub async fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    run(command, options, None).await
}

/// Execute a shell command, passing each output line to `callback` as it
/// arrives.
pub async fn execute_streaming(
    command: &str,
    options: &CommandOptions,
    callback: OutputCallback,
) -> Result<CommandResult> {
    run(command, options, Some(callback)).await
}

async fn run(
    command: &str,
    options: &CommandOptions,
    callback: Option<OutputCallback>,
) -> Result<CommandResult> {
    match options.timeout {
        Some(seconds) => {
            tokio::time::timeout(
                Duration::from_secs(seconds),
                spawn_and_collect(command, options, callback),
            )
            .await
            .map_err(|_| LaunchError::CommandTimeout {
                command: command.to_string(),
                seconds,
            })?
        }
        None => spawn_and_collect(command, options, callback).await,
    }
}

async fn spawn_and_collect(
    command: &str,
    options: &CommandOptions,
    callback: Option<OutputCallback>,
) -> Result<CommandResult> {
    let start = Instant::now();
    debug!("Executing: {}", command);

    let mut cmd = Command::new(shell_program());
    cmd.arg(shell_flag())
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    let spawn_failed = || LaunchError::CommandFailed {
        command: command.to_string(),
        code: None,
    };

    let mut child = cmd.spawn().map_err(|_| spawn_failed())?;
    let stdout = child.stdout.take().ok_or_else(spawn_failed)?;
    let stderr = child.stderr.take().ok_or_else(spawn_failed)?;

    let (stdout, stderr, status) = tokio::try_join!(
        collect_lines(stdout, OutputLine::Stdout, callback.as_ref()),
        collect_lines(stderr, OutputLine::Stderr, callback.as_ref()),
        child.wait(),
    )?;

    let duration = start.elapsed();
    debug!("Command exited with {:?} after {:?}", status.code(), duration);

    Ok(CommandResult {
        exit_code: status.code(),
        stdout,
        stderr,
        duration,
        success: status.success(),
    })
}

async fn collect_lines<R>(
    reader: R,
    wrap: fn(String) -> OutputLine,
    callback: Option<&OutputCallback>,
) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    // Lossy per line: tools may print raw bytes, which must not fail the step.
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut output = String::new();
    while reader.read_until(b'\n', &mut buf).await? > 0 {
        let end = buf
            .iter()
            .rposition(|b| *b != b'\n' && *b != b'\r')
            .map_or(0, |i| i + 1);
        let line = String::from_utf8_lossy(&buf[..end]).into_owned();
        buf.clear();
        output.push_str(&line);
        output.push('\n');
        if let Some(callback) = callback {
            callback(wrap(line));
        }
    }
    Ok(output)
}
