use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;
use std::sync::Mutex;

use rolling_rhino::executor::{CaptureResult, CommandExecutor, CommandSpec, ExecutionResult};

/// Fake executor returning canned capture output, recording every
/// invocation in order.
///
/// Responses are keyed by the command line (`"lsb_release --id --short"`).
/// Unconfigured captures behave like a spawn failure; unconfigured runs
/// succeed unless listed as failing.
pub struct MockExecutor {
    calls: Mutex<Vec<String>>,
    captures: HashMap<String, (String, bool)>,
    failing_runs: Vec<String>,
}

#[allow(dead_code)]
impl MockExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            captures: HashMap::new(),
            failing_runs: Vec::new(),
        }
    }

    /// Registers a successful capture for the given command line.
    pub fn with_capture(mut self, command_line: &str, stdout: &str) -> Self {
        self.captures
            .insert(command_line.to_string(), (stdout.to_string(), true));
        self
    }

    /// Registers a failing capture (non-zero exit) for the given command line.
    pub fn with_failed_capture(mut self, command_line: &str) -> Self {
        self.captures
            .insert(command_line.to_string(), (String::new(), false));
        self
    }

    /// Marks a side-effect command line as exiting non-zero.
    pub fn with_failing_run(mut self, command_line: &str) -> Self {
        self.failing_runs.push(command_line.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn key(spec: &CommandSpec) -> String {
        let mut parts = vec![spec.command.clone()];
        parts.extend(spec.args.iter().cloned());
        parts.join(" ")
    }
}

impl CommandExecutor for MockExecutor {
    fn capture(&self, spec: &CommandSpec) -> CaptureResult {
        let key = Self::key(spec);
        self.calls.lock().unwrap().push(key.clone());
        match self.captures.get(&key) {
            Some((stdout, ok)) => CaptureResult {
                stdout: stdout.clone(),
                ok: *ok,
            },
            None => CaptureResult {
                stdout: String::new(),
                ok: false,
            },
        }
    }

    fn run(&self, spec: &CommandSpec) -> ExecutionResult {
        let key = Self::key(spec);
        self.calls.lock().unwrap().push(key.clone());
        let raw = if self.failing_runs.contains(&key) {
            256 // wait status for exit code 1
        } else {
            0
        };
        ExecutionResult {
            status: Some(ExitStatus::from_raw(raw)),
        }
    }
}

/// Mock preconfigured to look like an Ubuntu development-branch host
/// with lsb_release available.
#[allow(dead_code)]
pub fn ubuntu_devel_mock() -> MockExecutor {
    MockExecutor::new()
        .with_capture("which lsb_release", "/usr/bin/lsb_release")
        .with_capture("lsb_release --id --short", "Ubuntu")
        .with_capture(
            "lsb_release --description --short",
            "Ubuntu Questing Quokka (development branch)",
        )
        .with_capture("lsb_release --codename --short", "questing")
}
