//! Operator evaluation.
//!
//! Direct enum dispatch: the type set is fixed, so pattern matching
//! beats trait objects and keeps the error cases exhaustive. Integer
//! arithmetic is checked; overflow is a runtime error, not a wrap.

use monkey_ir::{BinaryOp, UnaryOp};
use monkey_object::{
    division_by_zero, integer_overflow, type_mismatch, unknown_infix_operator,
    unknown_prefix_operator, EvalResult, Value,
};

/// Evaluate an infix operation.
pub fn evaluate_binary(left: Value, op: BinaryOp, right: Value) -> EvalResult {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => Ok(Value::string(format!("{a}{b}"))),
            _ => Err(unknown_infix_operator("STRING", op.as_str(), "STRING")),
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Ok(Value::from_bool(a == b)),
            BinaryOp::NotEq => Ok(Value::from_bool(a != b)),
            _ => Err(unknown_infix_operator("BOOLEAN", op.as_str(), "BOOLEAN")),
        },
        _ if left.type_name() != right.type_name() => Err(type_mismatch(
            left.type_name(),
            op.as_str(),
            right.type_name(),
        )),
        _ => match op {
            // Remaining same-type pairs (null, arrays, hashes,
            // functions): only equality is defined, structurally.
            BinaryOp::Eq => Ok(Value::from_bool(left == right)),
            BinaryOp::NotEq => Ok(Value::from_bool(left != right)),
            _ => Err(unknown_infix_operator(
                left.type_name(),
                op.as_str(),
                right.type_name(),
            )),
        },
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Add => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("addition")),
        BinaryOp::Sub => a
            .checked_sub(b)
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("subtraction")),
        BinaryOp::Mul => a
            .checked_mul(b)
            .map(Value::Int)
            .ok_or_else(|| integer_overflow("multiplication")),
        BinaryOp::Div => {
            if b == 0 {
                Err(division_by_zero())
            } else {
                // Truncates toward zero.
                a.checked_div(b)
                    .map(Value::Int)
                    .ok_or_else(|| integer_overflow("division"))
            }
        }
        BinaryOp::Lt => Ok(Value::from_bool(a < b)),
        BinaryOp::Gt => Ok(Value::from_bool(a > b)),
        BinaryOp::Eq => Ok(Value::from_bool(a == b)),
        BinaryOp::NotEq => Ok(Value::from_bool(a != b)),
    }
}

/// Evaluate a prefix operation.
pub fn evaluate_unary(op: UnaryOp, value: Value) -> EvalResult {
    match op {
        UnaryOp::Not => Ok(Value::from_bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Int(v) => v
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| integer_overflow("negation")),
            other => Err(unknown_prefix_operator("-", other.type_name())),
        },
    }
}
