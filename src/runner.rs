//! Pluggable process invocation.
//!
//! The line-discipline utility is an external collaborator; everything the
//! session needs from it fits one capability: run an argv, get back the exit
//! status and captured output. Tests substitute `MockRunner` so no real
//! device (or `stty` binary) is ever touched.

use std::collections::VecDeque;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Captured result of one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Process exit code; `-1` when the process was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    /// Successful empty output, convenient for mock scripting.
    pub fn ok() -> Self {
        Self {
            status: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Failing output with the given exit code and stderr text.
    pub fn failed(status: i32, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the process exited zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Capability to run an external command and capture its output.
pub trait CommandRunner: Send + std::fmt::Debug {
    /// Run `argv` (program first) to completion.
    ///
    /// Returns `Err` only when the process could not be spawned or waited
    /// on; a nonzero exit is a successful `run` with a failing status.
    fn run(&self, argv: &[String]) -> std::io::Result<ExecOutput>;
}

/// Runs commands on the real system via `std::process::Command`.
#[derive(Debug, Default, Clone)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> std::io::Result<ExecOutput> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv")
        })?;

        debug!(command = %argv.join(" "), "running external utility");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(ExecOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Inner state of the mock runner.
#[derive(Debug, Default)]
struct MockRunnerState {
    /// Scripted outcomes, consumed per call in FIFO order.
    script: VecDeque<std::io::Result<ExecOutput>>,
    /// Every argv this runner was asked to run.
    calls: Vec<Vec<String>>,
}

/// Scriptable command runner for tests.
///
/// Outcomes queued with [`push_ok`](MockRunner::push_ok) /
/// [`push_result`](MockRunner::push_result) are consumed one per `run` call;
/// once the script is exhausted, every further call succeeds with empty
/// output. Clones share state, so tests keep a probe handle while the
/// session owns the boxed runner.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockRunnerState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful empty outcome.
    pub fn push_ok(&self) {
        self.push_result(Ok(ExecOutput::ok()));
    }

    /// Queue an exit with the given code and stderr text.
    pub fn push_exit(&self, status: i32, stderr: impl Into<String>) {
        self.push_result(Ok(ExecOutput::failed(status, stderr)));
    }

    /// Queue an arbitrary outcome, including spawn failures.
    pub fn push_result(&self, result: std::io::Result<ExecOutput>) {
        self.state.lock().unwrap().script.push_back(result);
    }

    /// Every argv recorded so far.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, argv: &[String]) -> std::io::Result<ExecOutput> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(argv.to_vec());
        state.script.pop_front().unwrap_or_else(|| Ok(ExecOutput::ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_runner_captures_output() {
        let runner = SystemRunner::new();
        let out = runner
            .run(&["sh".into(), "-c".into(), "echo hello; exit 3".into()])
            .expect("spawn sh");
        assert_eq!(out.status, 3);
        assert_eq!(out.stdout, "hello\n");
        assert!(!out.success());
    }

    #[test]
    fn test_system_runner_rejects_empty_argv() {
        let runner = SystemRunner::new();
        assert!(runner.run(&[]).is_err());
    }

    #[test]
    fn test_system_runner_spawn_failure() {
        let runner = SystemRunner::new();
        let result = runner.run(&["/no/such/binary-ttyline".into()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mock_runner_scripted_outcomes() {
        let runner = MockRunner::new();
        runner.push_ok();
        runner.push_exit(1, "stty: bad device");

        let first = runner.run(&["stty".into(), "-F".into(), "/dev/x".into()]);
        assert!(first.unwrap().success());

        let second = runner.run(&["stty".into()]).unwrap();
        assert_eq!(second.status, 1);
        assert_eq!(second.stderr, "stty: bad device");

        // Exhausted script defaults to success.
        assert!(runner.run(&["stty".into()]).unwrap().success());

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], vec!["stty", "-F", "/dev/x"]);
    }

    #[test]
    fn test_mock_runner_spawn_failure() {
        let runner = MockRunner::new();
        runner.push_result(Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "stty missing",
        )));
        assert!(runner.run(&["stty".into()]).is_err());
    }
}
