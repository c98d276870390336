//! Compiler module - Source code compilation
//!
//! Runs a recipe's compile step once per submission. A failed compile is
//! reported as a message for the verdict, never as an `Err`.

use tracing::debug;

use crate::runner::{CommandSpec, RunLimits, RunStatus, Runner};

/// Result of a compilation attempt
#[derive(Debug)]
pub struct CompileResult {
    pub success: bool,
    pub message: Option<String>,
    pub time_ms: u64,
}

/// Run a compile command and interpret its outcome
pub async fn compile(runner: &dyn Runner, compile_cmd: &CommandSpec, limits: &RunLimits) -> CompileResult {
    debug!("Compiling with {:?}", compile_cmd.to_vec());

    let result = runner.run(compile_cmd, limits, None).await;

    if result.is_success() {
        return CompileResult {
            success: true,
            message: None,
            time_ms: result.time_ms,
        };
    }

    let error_msg = if let Some(error) = result.error.clone() {
        error
    } else if !result.stderr.trim().is_empty() {
        result.stderr.clone()
    } else if !result.stdout.trim().is_empty() {
        result.stdout.clone()
    } else {
        match result.status {
            RunStatus::Signaled(sig) => format!("Compiler crashed (signal {})", sig),
            RunStatus::Exited(code) => format!("Compilation failed with exit code {}", code),
            _ => "Compilation failed".to_string(),
        }
    };

    debug!("Compilation failed: {:?}", result.status);

    CompileResult {
        success: false,
        message: Some(error_msg),
        time_ms: result.time_ms,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::runner::{ProcessRunner, TIMEOUT_ERROR};

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").with_args(["-c", script])
    }

    #[tokio::test]
    async fn test_successful_compile() {
        let result = compile(&ProcessRunner::default(), &sh("exit 0"), &RunLimits::default()).await;
        assert!(result.success);
        assert!(result.message.is_none());
    }

    #[tokio::test]
    async fn test_compile_error_uses_stderr() {
        let result = compile(
            &ProcessRunner::default(),
            &sh("echo 'main.c:1: error: expected ;' >&2; exit 1"),
            &RunLimits::default(),
        )
        .await;
        assert!(!result.success);
        assert!(result.message.unwrap().contains("expected ;"));
    }

    #[tokio::test]
    async fn test_compile_error_falls_back_to_stdout_then_status() {
        let runner = ProcessRunner::default();

        let result = compile(&runner, &sh("echo 'syntax error'; exit 2"), &RunLimits::default()).await;
        assert_eq!(result.message.as_deref().map(str::trim), Some("syntax error"));

        let result = compile(&runner, &sh("exit 4"), &RunLimits::default()).await;
        assert_eq!(
            result.message.as_deref(),
            Some("Compilation failed with exit code 4")
        );
    }

    #[tokio::test]
    async fn test_compile_timeout() {
        let result = compile(
            &ProcessRunner::default(),
            &sh("sleep 10"),
            &RunLimits::new(200, 0),
        )
        .await;
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some(TIMEOUT_ERROR));
        assert_eq!(result.time_ms, 200);
    }
}
