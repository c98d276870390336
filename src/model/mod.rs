//! Core data model shared by every stage of the harness
//!
//! - `TestValue`: opaque input / output value with explicit parse and serialize
//! - `TestCase`, `Submission`: what the caller hands in
//! - `TestResult`, `ExecutionVerdict`: what the caller gets back

pub mod submission;
pub mod value;
pub mod verdict;

pub use submission::{Submission, TestCase};
pub use value::TestValue;
pub use verdict::{ExecutionStatus, ExecutionVerdict, TestResult, VerdictSummary};
