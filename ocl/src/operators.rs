//! Strict infix and prefix operators.
//!
//! The short-circuiting boolean operators live in the evaluator since they
//! control whether the right operand is evaluated at all.

use crate::{EvalError, EvalResult, InfixOp, PrefixOp};
use mrepo_core::Value;
use std::cmp::Ordering;

/// Apply a strict binary operator to two evaluated operands.
pub(crate) fn apply_infix(op: InfixOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match op {
        InfixOp::Eq => Ok(Value::Bool(left.equals(right))),
        InfixOp::Ne => Ok(Value::Bool(!left.equals(right))),
        InfixOp::Lt | InfixOp::Le | InfixOp::Gt | InfixOp::Ge => compare(op, left, right),
        InfixOp::Add | InfixOp::Sub | InfixOp::Mul => arithmetic(op, left, right),
        InfixOp::Div => divide(left, right),
        InfixOp::IntDiv | InfixOp::Mod => integer_division(op, left, right),
        InfixOp::Xor => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a ^ b)),
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            _ => Err(operand_mismatch(op, left, right)),
        },
        InfixOp::And | InfixOp::Or | InfixOp::Implies => Err(EvalError::type_mismatch(format!(
            "'{}' must be evaluated lazily",
            op
        ))),
    }
}

/// Apply a prefix operator.
pub(crate) fn apply_prefix(op: PrefixOp, operand: &Value) -> EvalResult<Value> {
    match (op, operand) {
        (_, Value::Null) => Ok(Value::Null),
        (PrefixOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::type_mismatch("integer overflow")),
        (PrefixOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (PrefixOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (PrefixOp::Neg, other) => Err(EvalError::type_mismatch(format!(
            "cannot negate {}",
            other.type_name()
        ))),
        (PrefixOp::Not, other) => Err(EvalError::type_mismatch(format!(
            "'not' expects Boolean, got {}",
            other.type_name()
        ))),
    }
}

fn compare(op: InfixOp, left: &Value, right: &Value) -> EvalResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    let ordering = left
        .compare(right)
        .ok_or_else(|| EvalError::not_comparable(left.to_string(), right.to_string()))?;
    let result = match op {
        InfixOp::Lt => ordering == Ordering::Less,
        InfixOp::Le => ordering != Ordering::Greater,
        InfixOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

fn arithmetic(op: InfixOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => {
            let result = match op {
                InfixOp::Add => a.checked_add(*b),
                InfixOp::Sub => a.checked_sub(*b),
                _ => a.checked_mul(*b),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| EvalError::type_mismatch("integer overflow"))
        }
        (Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
            let (a, b) = reals(left, right);
            Ok(Value::Real(match op {
                InfixOp::Add => a + b,
                InfixOp::Sub => a - b,
                _ => a * b,
            }))
        }
        (Value::String(a), Value::String(b)) if op == InfixOp::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        _ => Err(operand_mismatch(op, left, right)),
    }
}

/// `/`: Int when both operands are Int and the division is exact, Real otherwise.
fn divide(left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) if a.checked_rem(*b) == Some(0) => a
            .checked_div(*b)
            .map(Value::Int)
            .ok_or_else(|| EvalError::type_mismatch("integer overflow")),
        (Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
            let (a, b) = reals(left, right);
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Real(a / b))
        }
        _ => Err(operand_mismatch(InfixOp::Div, left, right)),
    }
}

fn integer_division(op: InfixOp, left: &Value, right: &Value) -> EvalResult<Value> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
        (Value::Int(a), Value::Int(b)) => {
            let result = if op == InfixOp::IntDiv {
                a.checked_div(*b)
            } else {
                a.checked_rem(*b)
            };
            result
                .map(Value::Int)
                .ok_or_else(|| EvalError::type_mismatch("integer overflow"))
        }
        _ => Err(operand_mismatch(op, left, right)),
    }
}

fn reals(left: &Value, right: &Value) -> (f64, f64) {
    (
        left.as_real().unwrap_or_default(),
        right.as_real().unwrap_or_default(),
    )
}

fn operand_mismatch(op: InfixOp, left: &Value, right: &Value) -> EvalError {
    EvalError::type_mismatch(format!(
        "cannot apply '{}' to {} and {}",
        op,
        left.type_name(),
        right.type_name()
    ))
}
