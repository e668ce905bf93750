//! Reshapes raw test-case tuples into the positional arguments an entry point
//! expects, driven only by the problem's [`Signature`].

use serde_json::Value;

use crate::error::GradingError;
use crate::problem::{Packing, Signature};

pub fn adapt(signature: &Signature, raw_input: &[Value]) -> Result<Vec<Value>, GradingError> {
    let args = match signature.packing {
        Packing::Positional => raw_input.to_vec(),
        Packing::SplitTrailing => split_trailing(raw_input),
    };

    if args.len() != signature.arity() {
        return Err(GradingError::ArityMismatch {
            expected: signature.arity(),
            actual: args.len(),
        });
    }

    Ok(args)
}

/// `[a, b, c, x]` and `[[a, b, c], x]` both become `[[a, b, c], x]`
fn split_trailing(raw_input: &[Value]) -> Vec<Value> {
    let Some((trailing, head)) = raw_input.split_last() else {
        return Vec::new();
    };

    let mut first = Vec::with_capacity(head.len());
    for value in head {
        match value {
            Value::Array(items) => first.extend(items.iter().cloned()),
            other => first.push(other.clone()),
        }
    }

    vec![Value::Array(first), trailing.clone()]
}
