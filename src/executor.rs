//! Command execution abstraction for rolling-rhino.
//!
//! This module provides:
//! - [`CommandSpec`]: Specification for commands to execute
//! - [`CaptureResult`]: Result of a captured query invocation
//! - [`ExecutionResult`]: Result of a side-effect invocation
//! - [`CommandExecutor`]: Trait for command execution strategies
//! - [`RealCommandExecutor`]: Production implementation using `std::process::Command`
//!
//! The preflight pipeline and the task runner only ever talk to the
//! [`CommandExecutor`] trait, so tests substitute fakes returning canned
//! output instead of spawning real processes. A failed external call is a
//! diagnostic input for the caller, not an error: both trait methods are
//! infallible and report spawn failure through their result types.

use std::process::{Command, ExitStatus, Stdio};

use which::which;

/// Formats string arguments into a space-separated, debug-quoted string.
///
/// Used by log output to consistently format command arguments
/// (e.g., `"--id" "--short"`).
pub(crate) fn format_command_args(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Specification for a command to be executed
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The command to execute (e.g., "lsb_release")
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set (in addition to inherited environment)
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Creates a new CommandSpec with command and args
    #[must_use]
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.args.is_empty() {
            f.write_str(&self.command)
        } else {
            write!(f, "{} {}", self.command, format_command_args(&self.args))
        }
    }
}

/// Result of a captured query invocation.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    /// Standard output with trailing newlines stripped. Empty when the
    /// command could not be spawned.
    pub stdout: String,
    /// True only if the command spawned and exited with status zero.
    pub ok: bool,
}

impl CaptureResult {
    /// A failed capture with no output (spawn failure or non-zero exit).
    pub(crate) fn failed() -> Self {
        Self {
            stdout: String::new(),
            ok: false,
        }
    }
}

/// Result of a side-effect invocation.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command. `None` means the command could not
    /// be launched at all (not found or spawn failure).
    pub status: Option<ExitStatus>,
}

impl ExecutionResult {
    /// Returns true if the command ran and exited successfully.
    pub fn success(&self) -> bool {
        self.status.is_some_and(|s| s.success())
    }

    /// Returns the exit code if available
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Trait for command execution.
///
/// Implementations must be `Send + Sync` so the executor can be shared
/// behind `Arc<dyn CommandExecutor>` across the workflow stages.
pub trait CommandExecutor: Send + Sync {
    /// Executes a command and captures its trimmed standard output.
    ///
    /// Used for the distribution-metadata and package-listing queries.
    /// Spawn failure and non-zero exit both yield `ok = false`.
    fn capture(&self, spec: &CommandSpec) -> CaptureResult;

    /// Executes a command for side effect with inherited stdio.
    ///
    /// Used for the apt maintenance tasks, whose progress output should
    /// reach the operator's terminal directly.
    fn run(&self, spec: &CommandSpec) -> ExecutionResult;
}

/// Command executor that runs actual system commands.
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    /// Resolves the command on PATH and prepares it with args and env.
    fn build(&self, spec: &CommandSpec) -> Option<Command> {
        let cmd = match which(&spec.command) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("command not found: {}: {}", spec.command, e);
                return None;
            }
        };
        tracing::trace!("command found: {}: {}", spec.command, cmd.to_string_lossy());

        let mut command = Command::new(cmd);
        command.args(&spec.args);
        for (key, value) in &spec.env {
            command.env(key, value);
        }
        Some(command)
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn capture(&self, spec: &CommandSpec) -> CaptureResult {
        let Some(mut command) = self.build(spec) else {
            return CaptureResult::failed();
        };
        command.stderr(Stdio::null());

        match command.output() {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout)
                    .trim_end_matches('\n')
                    .to_string();
                tracing::trace!(
                    "captured command: {}: success={}",
                    spec,
                    output.status.success()
                );
                CaptureResult {
                    stdout,
                    ok: output.status.success(),
                }
            }
            Err(e) => {
                tracing::debug!("failed to spawn command: {}: {}", spec, e);
                CaptureResult::failed()
            }
        }
    }

    fn run(&self, spec: &CommandSpec) -> ExecutionResult {
        let Some(mut command) = self.build(spec) else {
            return ExecutionResult { status: None };
        };

        match command.status() {
            Ok(status) => {
                tracing::trace!("executed command: {}: success={}", spec, status.success());
                ExecutionResult {
                    status: Some(status),
                }
            }
            Err(e) => {
                tracing::debug!("failed to spawn command: {}: {}", spec, e);
                ExecutionResult { status: None }
            }
        }
    }
}
