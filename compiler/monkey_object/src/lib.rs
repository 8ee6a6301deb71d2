//! Runtime value model for Monkey.
//!
//! Both back-ends speak this vocabulary: the [`Value`] variants, the
//! hashable key subset, the evaluator's scope-chain [`Env`], the shared
//! error type with its control-flow signal, and the builtin function
//! table.

mod builtins;
mod environment;
mod errors;
mod value;

pub use builtins::{builtin_by_name, BuiltinFn, BuiltinFunction, BUILTINS};
pub use environment::{Env, Scope};
pub use errors::{
    argument_not_supported, argument_wrong_type, division_by_zero, identifier_not_found,
    index_not_supported, integer_overflow, not_a_function, type_mismatch, unknown_infix_operator,
    unknown_prefix_operator, unusable_hash_key, wrong_number_of_arguments, ControlFlow, EvalError,
    EvalResult,
};
pub use value::{ClosureValue, CompiledFunction, FunctionValue, FxIndexMap, HashKey, Value};
