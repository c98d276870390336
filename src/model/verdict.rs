use serde::{Deserialize, Serialize};
use std::fmt;

use super::submission::TestCase;
use super::value::TestValue;

/// Overall status of a graded submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Passed,
    Failed,
    Error,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Passed => "passed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of running one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// 1-based position of the test case
    pub test_case_id: usize,
    pub input: TestValue,
    pub expected_output: TestValue,
    pub actual_output: Option<TestValue>,
    pub passed: bool,
    pub execution_time_ms: u64,
    #[serde(rename = "memoryUsedKB")]
    pub memory_used_kb: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestResult {
    /// True when the process itself failed (crash, timeout, launch failure)
    pub fn has_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

/// Final verdict of one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionVerdict {
    pub status: ExecutionStatus,
    pub execution_time_ms: u64,
    #[serde(rename = "memoryUsedKB")]
    pub memory_used_kb: u64,
    pub test_results: Vec<TestResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExecutionVerdict {
    /// Aggregate the attempted results of a run over `total_cases` test cases.
    ///
    /// `results` may be a strict prefix of the test cases when the run stopped
    /// early; in that case the verdict is never `Passed`.
    pub fn from_results(results: Vec<TestResult>, total_cases: usize) -> Self {
        let status = if results.iter().any(TestResult::has_error) {
            ExecutionStatus::Error
        } else if results.len() == total_cases && results.iter().all(|r| r.passed) {
            ExecutionStatus::Passed
        } else {
            ExecutionStatus::Failed
        };

        let execution_time_ms = results.iter().map(|r| r.execution_time_ms).sum();
        let memory_used_kb = results
            .iter()
            .map(|r| r.memory_used_kb)
            .max()
            .unwrap_or(0);

        Self {
            status,
            execution_time_ms,
            memory_used_kb,
            test_results: results,
            error_message: None,
        }
    }

    /// Submission-level failure with no test case attempted
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Error,
            execution_time_ms: 0,
            memory_used_kb: 0,
            test_results: vec![],
            error_message: Some(message.into()),
        }
    }

    pub fn passed_count(&self) -> usize {
        self.test_results.iter().filter(|r| r.passed).count()
    }

    /// Points awarded for this verdict: `floor(total_points * passed / total_cases)`
    pub fn points_earned(&self, total_points: u32, total_cases: usize) -> u32 {
        if total_cases == 0 {
            return 0;
        }
        let earned = u64::from(total_points) * self.passed_count() as u64 / total_cases as u64;
        earned as u32
    }

    /// View for end users: full detail for visible test cases, only counts for
    /// hidden ones.
    pub fn summary(&self, test_cases: &[TestCase]) -> VerdictSummary {
        let mut summary = VerdictSummary {
            status: self.status,
            passed: self.passed_count(),
            total: test_cases.len(),
            visible_results: Vec::new(),
            hidden_passed: 0,
            hidden_total: 0,
            error_message: self.error_message.clone(),
        };

        for (idx, case) in test_cases.iter().enumerate() {
            if !case.is_hidden {
                if let Some(result) = self.test_results.get(idx) {
                    summary.visible_results.push(result.clone());
                }
                continue;
            }
            summary.hidden_total += 1;
            if self.test_results.get(idx).is_some_and(|r| r.passed) {
                summary.hidden_passed += 1;
            }
        }

        summary
    }
}

/// What the presentation layer may show to the submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictSummary {
    pub status: ExecutionStatus,
    pub passed: usize,
    pub total: usize,
    pub visible_results: Vec<TestResult>,
    pub hidden_passed: usize,
    pub hidden_total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
