//! Judger module for processing one submission
//!
//! Compiles the submission when its language needs it, then runs the test
//! cases strictly in order, comparing each output and deciding when to stop.

use tracing::{debug, info};

use crate::checker::compare_output;
use crate::compiler;
use crate::languages::Recipe;
use crate::model::{ExecutionVerdict, TestCase, TestResult, TestValue};
use crate::runner::{RunLimits, RunStatus, Runner};
use crate::scratch::ScratchArtifact;

/// Judge a submission and remove its scratch files afterwards
pub async fn judge(
    runner: &dyn Runner,
    scratch: ScratchArtifact,
    recipe: &Recipe,
    test_cases: &[TestCase],
    limits: &RunLimits,
    compile_limits: &RunLimits,
) -> ExecutionVerdict {
    let verdict = run_test_cases(runner, recipe, test_cases, limits, compile_limits).await;
    scratch.cleanup(&recipe.cleanup).await;
    verdict
}

/// Compile (if needed) and run every test case, applying the early-stop rule.
///
/// A program that exits cleanly with a wrong answer keeps being tested; one
/// that crashes, fails to start or times out ends the run.
pub async fn run_test_cases(
    runner: &dyn Runner,
    recipe: &Recipe,
    test_cases: &[TestCase],
    limits: &RunLimits,
    compile_limits: &RunLimits,
) -> ExecutionVerdict {
    if let Some(compile_cmd) = &recipe.compile {
        let compile_result = compiler::compile(runner, compile_cmd, compile_limits).await;
        info!(
            "{} compile step took {}ms (success={})",
            recipe.language, compile_result.time_ms, compile_result.success
        );
        if !compile_result.success {
            return ExecutionVerdict::error(
                compile_result
                    .message
                    .unwrap_or_else(|| "Compilation failed".to_string()),
            );
        }
    }

    let mut results = Vec::with_capacity(test_cases.len());

    for (idx, tc) in test_cases.iter().enumerate() {
        let test_case_id = idx + 1;
        let input = tc.input.serialize();

        let outcome = runner.run(&recipe.run, limits, Some(&input)).await;
        let error = outcome.failure_message();
        let passed = error.is_none() && compare_output(&outcome.stdout, &tc.expected_output);

        let actual_output = match outcome.status {
            RunStatus::TimedOut | RunStatus::LaunchFailed => None,
            _ => Some(TestValue::parse(&outcome.stdout)),
        };

        debug!(
            "Test case {}/{}: passed={}, status={:?}, time={}ms",
            test_case_id,
            test_cases.len(),
            passed,
            outcome.status,
            outcome.time_ms
        );

        results.push(TestResult {
            test_case_id,
            input: tc.input.clone(),
            expected_output: tc.expected_output.clone(),
            actual_output,
            passed,
            execution_time_ms: outcome.time_ms,
            memory_used_kb: outcome.memory_kb,
            error,
        });

        if !passed && !outcome.is_success() {
            info!(
                "Stopping {} run after test case {} of {}: {:?}",
                recipe.language,
                test_case_id,
                test_cases.len(),
                outcome.status
            );
            break;
        }
    }

    let verdict = ExecutionVerdict::from_results(results, test_cases.len());
    debug!(
        "{} run finished: {} after {} of {} test cases",
        recipe.language,
        verdict.status,
        verdict.test_results.len(),
        test_cases.len()
    );
    verdict
}
