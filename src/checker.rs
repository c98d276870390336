//! Output comparison
//!
//! Decides whether a program's output matches the expected value while
//! tolerating representation differences: surrounding whitespace is ignored,
//! text that looks like JSON is compared structurally.

use serde_json::Value;

use crate::model::TestValue;

/// Compare raw program stdout against the expected value
pub fn compare_output(actual: &str, expected: &TestValue) -> bool {
    normalized_match(&TestValue::parse(actual), &expected.normalize())
}

/// Compare two values after normalizing both
pub fn values_match(actual: &TestValue, expected: &TestValue) -> bool {
    normalized_match(&actual.normalize(), &expected.normalize())
}

fn normalized_match(actual: &TestValue, expected: &TestValue) -> bool {
    match (actual, expected) {
        (TestValue::Text(a), TestValue::Text(b)) => a.trim() == b.trim(),
        (a, b) if a.is_structured() && b.is_structured() => {
            json_eq(&Value::from(actual.clone()), &Value::from(expected.clone()))
        }
        (TestValue::Number(a), TestValue::Number(b)) => numbers_eq(a, b),
        (TestValue::Bool(a), TestValue::Bool(b)) => a == b,
        (TestValue::Null, TestValue::Null) => true,
        _ => false,
    }
}

/// Deep equality; arrays are order sensitive, numbers compare by value
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_eq(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_eq(a: &serde_json::Number, b: &serde_json::Number) -> bool {
    if a == b {
        return true;
    }
    // 1 and 1.0 are the same number once printed by most languages
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
