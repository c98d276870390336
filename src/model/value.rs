//! Opaque test values
//!
//! Test inputs and expected outputs may be given either as plain text or as
//! structured JSON. Program output always arrives as text and is parsed the
//! same way before comparison.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A test input, expected output or captured program output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum TestValue {
    Text(String),
    Number(Number),
    Bool(bool),
    Null,
    /// JSON array
    List(Vec<Value>),
    /// JSON object
    Object(Map<String, Value>),
}

impl TestValue {
    /// Parse raw program output.
    ///
    /// The trimmed text is tried as JSON first; when that fails the trimmed
    /// text itself is kept. A JSON string literal becomes `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Self::from(value),
            Err(_) => TestValue::Text(trimmed.to_string()),
        }
    }

    /// Render the value as it should be fed to a program's stdin.
    ///
    /// Text is passed verbatim, everything else as compact JSON.
    pub fn serialize(&self) -> String {
        match self {
            TestValue::Text(s) => s.clone(),
            other => Value::from(other.clone()).to_string(),
        }
    }

    /// Canonical form used by the comparator: text goes through `parse`,
    /// already-typed values are kept as they are.
    pub fn normalize(&self) -> Self {
        match self {
            TestValue::Text(s) => Self::parse(s),
            other => other.clone(),
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, TestValue::List(_) | TestValue::Object(_))
    }
}

impl From<Value> for TestValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => TestValue::Text(s),
            Value::Number(n) => TestValue::Number(n),
            Value::Bool(b) => TestValue::Bool(b),
            Value::Null => TestValue::Null,
            Value::Array(items) => TestValue::List(items),
            Value::Object(map) => TestValue::Object(map),
        }
    }
}

impl From<TestValue> for Value {
    fn from(value: TestValue) -> Self {
        match value {
            TestValue::Text(s) => Value::String(s),
            TestValue::Number(n) => Value::Number(n),
            TestValue::Bool(b) => Value::Bool(b),
            TestValue::Null => Value::Null,
            TestValue::List(items) => Value::Array(items),
            TestValue::Object(map) => Value::Object(map),
        }
    }
}

impl From<&str> for TestValue {
    fn from(s: &str) -> Self {
        TestValue::Text(s.to_string())
    }
}

impl From<String> for TestValue {
    fn from(s: String) -> Self {
        TestValue::Text(s)
    }
}
