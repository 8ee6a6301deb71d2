//! Runtime error type and message constructors.
//!
//! Errors short-circuit evaluation: the first one produced propagates
//! unchanged through `?` to the nearest boundary. `return` rides the
//! same channel as a control-flow signal and is unwrapped exactly at
//! function and program boundaries, never observed by user code.
//!
//! The message strings are interface contract; construct them only
//! through the `#[cold]` factories here.

use std::fmt;

use crate::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, EvalError>;

/// Control-flow signal carried through the error channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlFlow {
    /// Return from the enclosing function (or program) with a value.
    Return(Value),
}

/// Runtime error (or in-flight control-flow signal).
#[derive(Clone, Debug, PartialEq)]
pub struct EvalError {
    /// Human-readable message.
    pub message: String,
    /// Set when this is a `return` in flight rather than a real error.
    pub control_flow: Option<ControlFlow>,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        EvalError {
            message: message.into(),
            control_flow: None,
        }
    }

    /// Create a return signal carrying `value`.
    pub fn return_with(value: Value) -> Self {
        EvalError {
            message: "return outside of a function".to_string(),
            control_flow: Some(ControlFlow::Return(value)),
        }
    }

    /// Check if this error is a control-flow signal.
    #[inline]
    pub fn is_control_flow(&self) -> bool {
        self.control_flow.is_some()
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EvalError {}

// Operator errors

/// Mixed operand types in an infix operation.
#[cold]
pub fn type_mismatch(left: &str, op: &str, right: &str) -> EvalError {
    EvalError::new(format!("type mismatch: {left} {op} {right}"))
}

/// Prefix operator applied to an unsupported type.
#[cold]
pub fn unknown_prefix_operator(op: &str, operand: &str) -> EvalError {
    EvalError::new(format!("unknown operator: {op}{operand}"))
}

/// Infix operator undefined for matching operand types.
#[cold]
pub fn unknown_infix_operator(left: &str, op: &str, right: &str) -> EvalError {
    EvalError::new(format!("unknown operator: {left} {op} {right}"))
}

/// Division (or any checked integer op) with a zero divisor.
#[cold]
pub fn division_by_zero() -> EvalError {
    EvalError::new("division by zero")
}

/// Checked integer arithmetic overflowed.
#[cold]
pub fn integer_overflow(operation: &str) -> EvalError {
    EvalError::new(format!("integer overflow in {operation}"))
}

// Name and call errors

/// Unresolvable identifier.
#[cold]
pub fn identifier_not_found(name: &str) -> EvalError {
    EvalError::new(format!("identifier not found: {name}"))
}

/// Call of a non-callable value.
#[cold]
pub fn not_a_function(type_name: &str) -> EvalError {
    EvalError::new(format!("not a function: {type_name}"))
}

/// Call arity mismatch.
#[cold]
pub fn wrong_number_of_arguments(want: usize, got: usize) -> EvalError {
    EvalError::new(format!("wrong number of arguments: want={want}, got={got}"))
}

// Collection errors

/// Hash key of an unhashable type.
#[cold]
pub fn unusable_hash_key(type_name: &str) -> EvalError {
    EvalError::new(format!("unusable as hash key: {type_name}"))
}

/// Index operation on a type that doesn't support it.
#[cold]
pub fn index_not_supported(type_name: &str) -> EvalError {
    EvalError::new(format!("index operator not supported: {type_name}"))
}

// Builtin argument errors

/// Builtin got an argument type it has no behavior for.
#[cold]
pub fn argument_not_supported(builtin: &str, type_name: &str) -> EvalError {
    EvalError::new(format!(
        "argument to `{builtin}` not supported, got {type_name}"
    ))
}

/// Builtin requires a specific argument type.
#[cold]
pub fn argument_wrong_type(builtin: &str, want: &str, got: &str) -> EvalError {
    EvalError::new(format!("argument to `{builtin}` must be {want}, got {got}"))
}
