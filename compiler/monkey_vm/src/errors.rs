//! VM runtime errors.
//!
//! Unlike the evaluator, where errors are propagated values, a VM error
//! terminates execution; the driver surfaces the single message. Shared
//! message formats (arity, hash keys, arithmetic) come from the
//! `monkey_object` factories and convert via `From`.

use std::fmt;

use monkey_object::EvalError;

/// A terminating VM condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VmError {
    pub message: String,
}

impl VmError {
    pub fn new(message: impl Into<String>) -> Self {
        VmError {
            message: message.into(),
        }
    }
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for VmError {}

impl From<EvalError> for VmError {
    fn from(error: EvalError) -> Self {
        VmError {
            message: error.message,
        }
    }
}

/// Value stack exhausted.
#[cold]
pub fn stack_overflow() -> VmError {
    VmError::new("stack overflow")
}

/// Call depth exceeded `MAX_FRAMES`.
#[cold]
pub fn frame_overflow() -> VmError {
    VmError::new("frame overflow")
}

/// Binary operation over an unsupported type pairing.
#[cold]
pub fn unsupported_types(left: &str, right: &str) -> VmError {
    VmError::new(format!(
        "unsupported types for binary operation: {left} {right}"
    ))
}

/// Arithmetic negation of a non-integer.
#[cold]
pub fn unsupported_negation(type_name: &str) -> VmError {
    VmError::new(format!("unsupported type for negation: {type_name}"))
}

/// Instruction stream contained a byte that is no opcode.
#[cold]
pub fn unknown_opcode(byte: u8) -> VmError {
    VmError::new(format!("unknown opcode: {byte}"))
}
