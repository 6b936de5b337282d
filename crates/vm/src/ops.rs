//! Operators on values. Every operator is strict about its operand types.

use std::cmp::Ordering;

use aurora_bytecode::error::Result;
use aurora_bytecode::{Value, ValueError};

fn invalid(op: &'static str, lhs: &Value, rhs: &Value) -> ValueError {
    ValueError::InvalidOperands {
        op,
        lhs: lhs.kind(),
        rhs: rhs.kind(),
    }
}

fn numbers(op: &'static str, lhs: &Value, rhs: &Value) -> Result<(f64, f64)> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(invalid(op, lhs, rhs)),
    }
}

fn booleans(op: &'static str, lhs: &Value, rhs: &Value) -> Result<(bool, bool)> {
    match (lhs, rhs) {
        (Value::Boolean(a), Value::Boolean(b)) => Ok((*a, *b)),
        _ => Err(invalid(op, lhs, rhs)),
    }
}

/// Numeric addition or string concatenation.
pub fn add(lhs: Value, rhs: Value) -> Result<Value> {
    match (&lhs, &rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), Value::String(b)) => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::String(s.into()))
        }
        _ => Err(invalid("+", &lhs, &rhs)),
    }
}

pub fn sub(lhs: Value, rhs: Value) -> Result<Value> {
    numbers("-", &lhs, &rhs).map(|(a, b)| Value::Number(a - b))
}

pub fn mul(lhs: Value, rhs: Value) -> Result<Value> {
    numbers("*", &lhs, &rhs).map(|(a, b)| Value::Number(a * b))
}

pub fn div(lhs: Value, rhs: Value) -> Result<Value> {
    numbers("/", &lhs, &rhs).map(|(a, b)| Value::Number(a / b))
}

/// Truncating remainder; the result takes the sign of the dividend.
pub fn rem(lhs: Value, rhs: Value) -> Result<Value> {
    numbers("%", &lhs, &rhs).map(|(a, b)| Value::Number(a - (a / b).trunc() * b))
}

pub fn neg(v: Value) -> Result<Value> {
    match v {
        Value::Number(n) => Ok(Value::Number(-n)),
        other => Err(ValueError::InvalidOperand {
            op: "-",
            operand: other.kind(),
        }),
    }
}

pub fn not(v: Value) -> Result<Value> {
    match v {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(ValueError::InvalidOperand {
            op: "not",
            operand: other.kind(),
        }),
    }
}

pub fn and(lhs: Value, rhs: Value) -> Result<Value> {
    booleans("and", &lhs, &rhs).map(|(a, b)| Value::Boolean(a && b))
}

pub fn or(lhs: Value, rhs: Value) -> Result<Value> {
    booleans("or", &lhs, &rhs).map(|(a, b)| Value::Boolean(a || b))
}

pub fn eq(lhs: Value, rhs: Value) -> Result<Value> {
    Ok(Value::Boolean(lhs == rhs))
}

pub fn neq(lhs: Value, rhs: Value) -> Result<Value> {
    Ok(Value::Boolean(lhs != rhs))
}

/// Ordering of two numbers or two strings. Strings compare
/// lexicographically; any comparison involving NaN is false.
fn compare(
    op: &'static str,
    lhs: &Value,
    rhs: &Value,
    pred: impl FnOnce(Ordering) -> bool,
) -> Result<Value> {
    let ordering = match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => return Err(invalid(op, lhs, rhs)),
    };
    Ok(Value::Boolean(ordering.map_or(false, pred)))
}

pub fn lt(lhs: Value, rhs: Value) -> Result<Value> {
    compare("<", &lhs, &rhs, Ordering::is_lt)
}

pub fn gt(lhs: Value, rhs: Value) -> Result<Value> {
    compare(">", &lhs, &rhs, Ordering::is_gt)
}

pub fn lte(lhs: Value, rhs: Value) -> Result<Value> {
    compare("<=", &lhs, &rhs, Ordering::is_le)
}

pub fn gte(lhs: Value, rhs: Value) -> Result<Value> {
    compare(">=", &lhs, &rhs, Ordering::is_ge)
}
