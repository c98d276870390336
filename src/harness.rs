//! Execution harness - public entry point
//!
//! `ExecutionHarness::execute` always returns a verdict. Unsupported
//! languages, scratch-file failures and even a panic while judging are turned
//! into an `error` verdict instead of reaching the caller.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::judger;
use crate::languages::ToolchainTable;
use crate::model::{ExecutionVerdict, Submission, TestCase};
use crate::runner::{ProcessRunner, RunLimits, Runner};
use crate::scratch::ScratchArtifact;

/// Grades submissions. Cheap to clone and safe to share between tasks: it
/// holds no mutable state.
#[derive(Clone)]
pub struct ExecutionHarness {
    toolchains: Arc<ToolchainTable>,
    runner: Arc<dyn Runner>,
    config: Arc<HarnessConfig>,
}

impl ExecutionHarness {
    /// Harness using the configured (or built-in) toolchain table and a
    /// host process runner
    pub fn new(config: HarnessConfig) -> anyhow::Result<Self> {
        let toolchains = match &config.languages_path {
            Some(path) => ToolchainTable::from_file(path)?,
            None => ToolchainTable::builtin()?,
        };
        let runner = ProcessRunner::new(config.max_output_bytes);
        Ok(Self::with_parts(toolchains, Arc::new(runner), config))
    }

    /// Harness with an explicit toolchain table and runner
    pub fn with_parts(toolchains: ToolchainTable, runner: Arc<dyn Runner>, config: HarnessConfig) -> Self {
        Self {
            toolchains: Arc::new(toolchains),
            runner,
            config: Arc::new(config),
        }
    }

    pub fn toolchains(&self) -> &ToolchainTable {
        &self.toolchains
    }

    /// Grade one submission
    pub async fn execute(&self, submission: Submission) -> ExecutionVerdict {
        let started = Instant::now();
        info!(
            "Received submission: language={}, testcases={}, time_limit={}ms",
            submission.language,
            submission.test_cases.len(),
            submission.time_limit_ms
        );

        let harness = self.clone();
        let task = tokio::spawn(async move { harness.run_submission(&submission).await });

        let verdict = match task.await {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => {
                match &e {
                    HarnessError::UnsupportedLanguage { language } => {
                        warn!("Unsupported language: {}", language)
                    }
                    other => error!("Failed to judge submission: {}", other),
                }
                ExecutionVerdict::error(e.to_string())
            }
            Err(e) => {
                let e = HarnessError::Internal(anyhow::anyhow!("judge task failed: {}", e));
                error!("{}", e);
                ExecutionVerdict::error(e.to_string())
            }
        };

        info!(
            "Submission summary: status={}, passed={}/{}, time={}ms, memory={}KB, wall={}ms",
            verdict.status,
            verdict.passed_count(),
            verdict.test_results.len(),
            verdict.execution_time_ms,
            verdict.memory_used_kb,
            started.elapsed().as_millis()
        );

        verdict
    }

    /// Same as [`execute`](Self::execute) with the submission given field by field
    pub async fn execute_parts(
        &self,
        source_code: &str,
        language: &str,
        test_cases: &[TestCase],
        time_limit_ms: u32,
        memory_limit_kb: u64,
    ) -> ExecutionVerdict {
        self.execute(Submission {
            source_code: source_code.to_string(),
            language: language.to_string(),
            test_cases: test_cases.to_vec(),
            time_limit_ms,
            memory_limit_kb,
        })
        .await
    }

    async fn run_submission(&self, submission: &Submission) -> Result<ExecutionVerdict> {
        let lang_config = self.toolchains.resolve(&submission.language)?;

        let scratch = ScratchArtifact::create(
            &self.config.scratch_root,
            &lang_config.source_file,
            &submission.source_code,
        )
        .await?;
        let recipe = lang_config.recipe(&scratch);
        debug!(
            "Prepared {} source (.{}) at {}",
            recipe.language,
            recipe.extension,
            recipe.source_path.display()
        );

        let limits = RunLimits::new(submission.time_limit_ms, submission.memory_limit_kb);
        let compile_limits = RunLimits::new(
            self.config.compile_time_limit(submission.time_limit_ms),
            submission.memory_limit_kb,
        );

        Ok(judger::judge(
            self.runner.as_ref(),
            scratch,
            &recipe,
            &submission.test_cases,
            &limits,
            &compile_limits,
        )
        .await)
    }
}
