//! Code execution and grading harness
//!
//! Takes untrusted source code in one of several languages, builds it when
//! needed, runs it against an ordered list of test cases under a wall-clock
//! limit and returns a verdict with partial credit.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use grader::{ExecutionHarness, HarnessConfig, TestCase};
//!
//! let harness = ExecutionHarness::new(HarnessConfig::default())?;
//! let verdict = harness
//!     .execute_parts("print(int(input()) * 2)", "python", &[TestCase::new("21", "42")], 2000, 262144)
//!     .await;
//! println!("{}", verdict.status);
//! # Ok(())
//! # }
//! ```
//!
//! No sandboxing is applied: programs run as the current user, inside a
//! per-submission scratch directory. The memory limit is accepted but not
//! enforced.

pub mod checker;
pub mod compiler;
pub mod config;
pub mod error;
pub mod harness;
pub mod judger;
pub mod languages;
pub mod model;
pub mod runner;
pub mod scratch;

pub use crate::config::HarnessConfig;
pub use crate::error::HarnessError;
pub use crate::harness::ExecutionHarness;
pub use crate::languages::{LanguageConfig, Recipe, ToolchainTable};
pub use crate::model::{
    ExecutionStatus, ExecutionVerdict, Submission, TestCase, TestResult, TestValue, VerdictSummary,
};
pub use crate::runner::{CommandSpec, ProcessRunner, RunLimits, RunOutcome, RunStatus, Runner};
