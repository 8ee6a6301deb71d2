//! Builtin functions.
//!
//! One fixed-order table shared by both back-ends: the evaluator
//! resolves builtins by name after an environment miss, the compiler
//! pre-defines them in the symbol table in table order, and the VM's
//! `GetBuiltin` indexes the same table. Keep the order stable; it is
//! part of the bytecode encoding.

use monkey_ir::StringLookup;

use crate::errors::{
    argument_not_supported, argument_wrong_type, wrong_number_of_arguments, EvalError,
};
use crate::Value;

/// Native function signature.
///
/// The lookup handle is only needed to display values (`puts`).
pub type BuiltinFn = fn(&[Value], &dyn StringLookup) -> Result<Value, EvalError>;

/// A named native function.
pub struct BuiltinFunction {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl std::fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BuiltinFunction({})", self.name)
    }
}

/// The builtin table, in bytecode index order.
pub static BUILTINS: &[BuiltinFunction] = &[
    BuiltinFunction {
        name: "len",
        func: builtin_len,
    },
    BuiltinFunction {
        name: "puts",
        func: builtin_puts,
    },
    BuiltinFunction {
        name: "first",
        func: builtin_first,
    },
    BuiltinFunction {
        name: "last",
        func: builtin_last,
    },
    BuiltinFunction {
        name: "rest",
        func: builtin_rest,
    },
    BuiltinFunction {
        name: "push",
        func: builtin_push,
    },
];

/// Look up a builtin by name.
pub fn builtin_by_name(name: &str) -> Option<&'static BuiltinFunction> {
    BUILTINS.iter().find(|b| b.name == name)
}

fn expect_arity(args: &[Value], want: usize) -> Result<(), EvalError> {
    if args.len() == want {
        Ok(())
    } else {
        Err(wrong_number_of_arguments(want, args.len()))
    }
}

/// `len(x)`: string byte length or array element count.
fn builtin_len(args: &[Value], _names: &dyn StringLookup) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Int(as_i64(s.len()))),
        Value::Array(items) => Ok(Value::Int(as_i64(items.len()))),
        other => Err(argument_not_supported("len", other.type_name())),
    }
}

/// `puts(...)`: print each argument's display form on its own line.
fn builtin_puts(args: &[Value], names: &dyn StringLookup) -> Result<Value, EvalError> {
    for arg in args {
        println!("{}", arg.display(names));
    }
    Ok(Value::Null)
}

/// `first(array)`: first element, or null when empty.
fn builtin_first(args: &[Value], _names: &dyn StringLookup) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(items.first().cloned().unwrap_or(Value::Null)),
        other => Err(argument_wrong_type("first", "ARRAY", other.type_name())),
    }
}

/// `last(array)`: last element, or null when empty.
fn builtin_last(args: &[Value], _names: &dyn StringLookup) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(items.last().cloned().unwrap_or(Value::Null)),
        other => Err(argument_wrong_type("last", "ARRAY", other.type_name())),
    }
}

/// `rest(array)`: a new array without the first element, or null when
/// empty.
fn builtin_rest(args: &[Value], _names: &dyn StringLookup) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::array(items[1..].to_vec()))
            }
        }
        other => Err(argument_wrong_type("rest", "ARRAY", other.type_name())),
    }
}

/// `push(array, value)`: a new array with `value` appended.
fn builtin_push(args: &[Value], _names: &dyn StringLookup) -> Result<Value, EvalError> {
    expect_arity(args, 2)?;
    match &args[0] {
        Value::Array(items) => {
            let mut next = items.as_ref().clone();
            next.push(args[1].clone());
            Ok(Value::array(next))
        }
        other => Err(argument_wrong_type("push", "ARRAY", other.type_name())),
    }
}

#[inline]
fn as_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
