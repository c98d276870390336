use serde::{Deserialize, Serialize};

use super::value::TestValue;

/// One (input, expected output) pair used to judge a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: TestValue,
    pub expected_output: TestValue,
    #[serde(default)]
    pub description: String,
    /// Only affects what is shown to the end user, never how the case is run
    #[serde(default)]
    pub is_hidden: bool,
}

impl TestCase {
    pub fn new(input: impl Into<TestValue>, expected_output: impl Into<TestValue>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            description: String::new(),
            is_hidden: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Submission received from the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(alias = "code")]
    pub source_code: String,
    pub language: String,
    pub test_cases: Vec<TestCase>,
    pub time_limit_ms: u32,
    /// Informational only, not enforced
    #[serde(rename = "memoryLimitKB", alias = "memoryLimitKb", default)]
    pub memory_limit_kb: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_from_json() {
        let submission: Submission = serde_json::from_str(
            r#"{
                "code": "print(input())",
                "language": "python",
                "testCases": [
                    {"input": "hi", "expectedOutput": "hi", "description": "echo"},
                    {"input": [1, 2], "expectedOutput": 3, "isHidden": true}
                ],
                "timeLimitMs": 2000,
                "memoryLimitKB": 262144
            }"#,
        )
        .unwrap();

        assert_eq!(submission.source_code, "print(input())");
        assert_eq!(submission.test_cases.len(), 2);
        assert!(!submission.test_cases[0].is_hidden);
        assert!(submission.test_cases[1].is_hidden);
        assert_eq!(submission.test_cases[1].description, "");
        assert_eq!(submission.memory_limit_kb, 262144);
    }
}
