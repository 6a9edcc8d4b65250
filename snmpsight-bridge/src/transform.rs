//! Sandboxed evaluation of per-sensor transform expressions.
//!
//! Expressions run in an immutable `evalexpr` context whose only variable is
//! `value`. Assignments fail and no function has side effects outside the
//! evaluator.

use evalexpr::{ContextWithMutableVariables, HashMapContext, Value};

use snmpsight_common::DecodedValue;

use crate::decoder::DecodeError;

/// Evaluate `expression` with `value` bound to the decoded input.
pub fn apply(expression: &str, value: &DecodedValue) -> Result<DecodedValue, DecodeError> {
    let mut context = HashMapContext::new();
    context
        .set_value("value".to_string(), bind(value))
        .map_err(|e| transform_error(expression, e))?;

    let result =
        evalexpr::eval_with_context(expression, &context).map_err(|e| transform_error(expression, e))?;

    match result {
        Value::Float(f) => Ok(DecodedValue::Number(f)),
        Value::Int(i) => Ok(DecodedValue::Number(i as f64)),
        Value::String(s) => Ok(DecodedValue::Text(s)),
        Value::Boolean(b) => Ok(DecodedValue::Number(if b { 1.0 } else { 0.0 })),
        Value::Tuple(_) => Err(non_scalar(expression, "tuple")),
        Value::Empty => Err(non_scalar(expression, "empty")),
    }
}

fn bind(value: &DecodedValue) -> Value {
    match value {
        DecodedValue::Text(s) => Value::String(s.clone()),
        DecodedValue::Number(n) => Value::Float(*n),
        // Bound as a float like every other number so `/` never truncates.
        DecodedValue::BigInt(n) => Value::Float(n.to_string().parse().unwrap_or(f64::INFINITY)),
    }
}

fn transform_error(expression: &str, err: impl std::fmt::Display) -> DecodeError {
    DecodeError::Transform {
        expression: expression.to_string(),
        message: err.to_string(),
    }
}

fn non_scalar(expression: &str, kind: &str) -> DecodeError {
    DecodeError::NonScalar {
        expression: expression.to_string(),
        kind: kind.to_string(),
    }
}
