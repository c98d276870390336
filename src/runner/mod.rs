//! Runner module - Execution abstraction layer
//!
//! This module provides a unified interface for running one external program:
//! - `ProcessRunner`: spawns the program directly on the host
//!
//! The runner module does NOT:
//! - Compare outputs or determine verdicts
//! - Know about languages or compilation
//! - Clean up scratch files

pub mod process;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Error reported when a program is killed for exceeding its time limit
pub const TIMEOUT_ERROR: &str = "Execution timeout";

/// Command specification for execution
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    /// Program path or name
    pub program: String,
    /// Arguments to the program
    pub args: Vec<String>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Working directory
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            work_dir: None,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Create from a command vector (first element is program, rest are args)
    pub fn from_vec(cmd: &[String]) -> Self {
        let mut iter = cmd.iter();
        let program = iter.next().cloned().unwrap_or_default();
        Self::new(program).with_args(iter.cloned())
    }

    /// Convert to a vector of strings (program + args)
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.clone()];
        v.extend(self.args.iter().cloned());
        v
    }
}

/// Resource limits for execution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunLimits {
    /// Wall-clock time limit in milliseconds
    pub time_ms: u32,
    /// Memory limit in KB (informational, not enforced)
    pub memory_kb: u64,
}

impl RunLimits {
    pub fn new(time_ms: u32, memory_kb: u64) -> Self {
        Self { time_ms, memory_kb }
    }
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            time_ms: 1000,
            memory_kb: 256 * 1024,
        }
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
    /// Wall-clock limit exceeded, process group killed
    TimedOut,
    /// Process could not be started
    LaunchFailed,
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

/// Outcome of running a program
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Execution status
    pub status: RunStatus,
    /// Stdout content
    pub stdout: String,
    /// Stderr content
    pub stderr: String,
    /// Wall-clock time in milliseconds
    pub time_ms: u64,
    /// Peak memory in KB (best-effort, 0 if unmeasured)
    pub memory_kb: u64,
    /// Launch failure or timeout description
    pub error: Option<String>,
}

impl RunOutcome {
    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::LaunchFailed,
            stdout: String::new(),
            stderr: String::new(),
            time_ms: 0,
            memory_kb: 0,
            error: Some(message.into()),
        }
    }

    pub fn timed_out(limits: &RunLimits, memory_kb: u64) -> Self {
        Self {
            status: RunStatus::TimedOut,
            stdout: String::new(),
            stderr: String::new(),
            time_ms: u64::from(limits.time_ms),
            memory_kb,
            error: Some(TIMEOUT_ERROR.to_string()),
        }
    }

    /// Why the process did not complete successfully, if it didn't
    pub fn failure_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        match self.status {
            RunStatus::Exited(0) => None,
            _ if !self.stderr.trim().is_empty() => Some(self.stderr.trim().to_string()),
            RunStatus::Exited(code) => Some(format!("Process exited with code {}", code)),
            RunStatus::Signaled(sig) => Some(format!("Process terminated by signal {}", sig)),
            RunStatus::TimedOut => Some(TIMEOUT_ERROR.to_string()),
            RunStatus::LaunchFailed => Some("Failed to start process".to_string()),
        }
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command with the given limits and optional stdin.
    ///
    /// A failing program is not an error: it is reported through the outcome.
    async fn run(&self, cmd: &CommandSpec, limits: &RunLimits, stdin: Option<&str>) -> RunOutcome;
}

// Re-exports
pub use process::ProcessRunner;

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: RunStatus, stderr: &str) -> RunOutcome {
        RunOutcome {
            status,
            stdout: String::new(),
            stderr: stderr.to_string(),
            time_ms: 5,
            memory_kb: 0,
            error: None,
        }
    }

    #[test]
    fn test_command_spec_from_vec() {
        let cmd = CommandSpec::from_vec(&["g++".into(), "-O2".into(), "main.cpp".into()]);
        assert_eq!(cmd.program, "g++");
        assert_eq!(cmd.args, vec!["-O2", "main.cpp"]);
        assert_eq!(cmd.to_vec(), vec!["g++", "-O2", "main.cpp"]);
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(outcome(RunStatus::Exited(0), "warning").failure_message(), None);
        assert_eq!(
            outcome(RunStatus::Exited(1), "  boom\n").failure_message().as_deref(),
            Some("boom")
        );
        assert_eq!(
            outcome(RunStatus::Exited(3), "").failure_message().as_deref(),
            Some("Process exited with code 3")
        );
        assert_eq!(
            outcome(RunStatus::Signaled(11), "").failure_message().as_deref(),
            Some("Process terminated by signal 11")
        );
        assert_eq!(
            RunOutcome::timed_out(&RunLimits::new(1000, 0), 0)
                .failure_message()
                .as_deref(),
            Some(TIMEOUT_ERROR)
        );
    }

    #[test]
    fn test_timed_out_reports_the_limit() {
        let outcome = RunOutcome::timed_out(&RunLimits::new(1500, 0), 42);
        assert_eq!(outcome.time_ms, 1500);
        assert_eq!(outcome.memory_kb, 42);
        assert!(!outcome.is_success());
    }
}
