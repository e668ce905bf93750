use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::problem::ComparisonPolicy;

/// Decides whether `actual` satisfies `expected`
///
/// Under [`ComparisonPolicy::Unordered`], two arrays are compared after
/// sorting copies of both by their natural order, so answers that are valid
/// in any order (enumerations, index pairs) are accepted. Anything else falls
/// back to deep structural equality. No floating point tolerance is applied.
pub fn equal(actual: &Value, expected: &Value, policy: ComparisonPolicy) -> bool {
    match (policy, actual, expected) {
        (ComparisonPolicy::Unordered, Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return false;
            }
            let mut a: Vec<&Value> = a.iter().collect();
            let mut b: Vec<&Value> = b.iter().collect();
            a.sort_by(|x, y| natural_cmp(x, y));
            b.sort_by(|x, y| natural_cmp(x, y));
            a.iter().zip(b.iter()).all(|(x, y)| deep_equal(x, y))
        }
        _ => deep_equal(actual, expected),
    }
}

/// Structural equality where `1` and `1.0` are the same number
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y) == Ordering::Equal,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| deep_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| deep_equal(v, w)))
        }
        _ => a == b,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object
fn natural_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (p, q) in x.iter().zip(y.iter()) {
                match natural_cmp(p, q) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn number_cmp(x: &Number, y: &Number) -> Ordering {
    if let (Some(p), Some(q)) = (x.as_i64(), y.as_i64()) {
        return p.cmp(&q);
    }
    if let (Some(p), Some(q)) = (x.as_u64(), y.as_u64()) {
        return p.cmp(&q);
    }
    let p = x.as_f64().unwrap_or(f64::NAN);
    let q = y.as_f64().unwrap_or(f64::NAN);
    // -0.0 and 0.0 are the same answer; only NaN needs the total order
    p.partial_cmp(&q).unwrap_or_else(|| p.total_cmp(&q))
}
