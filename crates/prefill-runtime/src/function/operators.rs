//! Operator execution
//!
//! Document values reach rules as text, so numeric-looking strings compare
//! and compute as numbers.

use prefill_core::ast::{Operator, UnaryOperator};
use prefill_core::Value;

use crate::error::{Result, RuntimeError};

/// Execute a comparison operation
pub(crate) fn execute_compare(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    // Null only equals null; ordering against null is false
    match (left, right) {
        (Value::Null, Value::Null) => return Ok(matches!(op, Operator::Eq | Operator::Le | Operator::Ge)),
        (Value::Null, _) | (_, Value::Null) => {
            tracing::debug!(
                "Null comparison: {:?} {} {:?}",
                left,
                op.symbol(),
                right
            );
            return Ok(op == Operator::Ne);
        }
        _ => {}
    }

    if let (Some(l), Some(r)) = (left.as_number(), right.as_number()) {
        return Ok(match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::Gt => l > r,
            Operator::Ge => l >= r,
            Operator::Lt => l < r,
            Operator::Le => l <= r,
            _ => return Err(not_a_comparison(op)),
        });
    }

    match (left, right) {
        (Value::String(l), Value::String(r)) => Ok(match op {
            Operator::Eq => l == r,
            Operator::Ne => l != r,
            Operator::Gt => l > r,
            Operator::Ge => l >= r,
            Operator::Lt => l < r,
            Operator::Le => l <= r,
            _ => return Err(not_a_comparison(op)),
        }),
        (Value::Bool(l), Value::Bool(r)) => match op {
            Operator::Eq => Ok(l == r),
            Operator::Ne => Ok(l != r),
            _ => Err(RuntimeError::TypeError(format!(
                "Cannot order booleans with {}",
                op.symbol()
            ))),
        },
        _ => match op {
            Operator::Eq => Ok(false),
            Operator::Ne => Ok(true),
            _ => Err(RuntimeError::TypeError(format!(
                "Cannot compare {} and {} with {}",
                left.type_name(),
                right.type_name(),
                op.symbol()
            ))),
        },
    }
}

fn not_a_comparison(op: Operator) -> RuntimeError {
    RuntimeError::InvalidOperation(format!("{} is not a comparison", op.symbol()))
}

/// Execute an arithmetic operation
pub(crate) fn execute_binary_op(left: &Value, op: Operator, right: &Value) -> Result<Value> {
    // Null in any arithmetic operation yields Null
    if left.is_null() || right.is_null() {
        tracing::debug!(
            "Null in binary operation: {:?} {} {:?}, returning Null",
            left,
            op.symbol(),
            right
        );
        return Ok(Value::Null);
    }

    if op == Operator::Add {
        if let (Value::String(_), _) | (_, Value::String(_)) = (left, right) {
            if !(left.as_number().is_some() && right.as_number().is_some()) {
                return Ok(Value::String(format!("{}{}", left, right)));
            }
        }
    }

    let (l, r) = match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(RuntimeError::TypeError(format!(
                "Cannot apply {} to {} and {}",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )))
        }
    };

    match op {
        Operator::Add => Ok(Value::Number(l + r)),
        Operator::Sub => Ok(Value::Number(l - r)),
        Operator::Mul => Ok(Value::Number(l * r)),
        Operator::Div => {
            if r == 0.0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Number(l / r))
            }
        }
        Operator::Mod => {
            if r == 0.0 {
                Err(RuntimeError::DivisionByZero)
            } else {
                Ok(Value::Number(l % r))
            }
        }
        _ => Err(RuntimeError::InvalidOperation(format!(
            "{} is not an arithmetic operator",
            op.symbol()
        ))),
    }
}

/// Execute a unary operation
pub(crate) fn execute_unary_op(op: UnaryOperator, operand: &Value) -> Result<Value> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOperator::Negate => match operand {
            Value::Null => Ok(Value::Null),
            other => other
                .as_number()
                .map(|n| Value::Number(-n))
                .ok_or_else(|| RuntimeError::TypeError(format!("Cannot negate {}", other.type_name()))),
        },
    }
}
