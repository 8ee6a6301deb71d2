//! Runtime values.
//!
//! Scalars (`Int`, `Bool`, `Null`) are inline; `true`, `false`, and
//! `null` are unit values, so identity comparison and value comparison
//! coincide, which is the singleton behavior the language needs. Heap
//! values go behind `Rc` through the factory constructors; the pipeline
//! is single-threaded, so no atomics.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use monkey_code::Instructions;
use monkey_ir::{pretty, ParamRange, SharedArena, StmtRange, StringLookup};
use rustc_hash::FxBuildHasher;

use crate::builtins::BuiltinFunction;
use crate::environment::Env;

/// Insertion-ordered map with the compiler-grade hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// The null value.
    Null,
    /// String value.
    Str(Rc<str>),
    /// Array of values, order preserved.
    Array(Rc<Vec<Value>>),
    /// Hash map, insertion order preserved.
    Hash(Rc<FxIndexMap<HashKey, Value>>),
    /// Evaluator closure: parameters, body, and the defining scope.
    Function(FunctionValue),
    /// Compiled function body (VM constant).
    CompiledFunction(Rc<CompiledFunction>),
    /// VM closure: compiled function plus captured free values.
    Closure(Rc<ClosureValue>),
    /// Native builtin function.
    Builtin(&'static BuiltinFunction),
}

impl Value {
    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Rc::from(s.into()))
    }

    /// Create an array value.
    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    /// Create a hash value.
    #[inline]
    pub fn hash(entries: FxIndexMap<HashKey, Value>) -> Self {
        Value::Hash(Rc::new(entries))
    }

    /// Boolean value from a native bool.
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Interface type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Bool(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
        }
    }

    /// Truthiness: everything except `false`, `null`, and integer zero.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Null | Value::Int(0))
    }

    /// Display form for the REPL.
    ///
    /// Strings render raw (no quotes); functions render their canonical
    /// source form via their own arena.
    pub fn display(&self, names: &dyn StringLookup) -> String {
        match self {
            Value::Int(value) => value.to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Null => "null".to_string(),
            Value::Str(value) => value.to_string(),
            Value::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| item.display(names))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{items}]")
            }
            Value::Hash(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key.display(), value.display(names)))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{entries}}}")
            }
            Value::Function(function) => function.display(names),
            Value::CompiledFunction(function) => {
                format!("CompiledFunction[{:p}]", Rc::as_ptr(function))
            }
            Value::Closure(closure) => format!("Closure[{:p}]", Rc::as_ptr(closure)),
            Value::Builtin(builtin) => format!("builtin function {}", builtin.name),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for data; identity for functions.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.same_closure(b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            _ => false,
        }
    }
}

/// The hashable key subset: integers, booleans, and strings.
///
/// Hashing is by value: integers by numeric value, booleans by
/// identity, strings by content.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum HashKey {
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
}

impl HashKey {
    /// Convert a value into a hash key.
    ///
    /// Any other value type is an error: `unusable as hash key: <T>`.
    pub fn from_value(value: &Value) -> Result<HashKey, crate::EvalError> {
        match value {
            Value::Int(v) => Ok(HashKey::Int(*v)),
            Value::Bool(v) => Ok(HashKey::Bool(*v)),
            Value::Str(v) => Ok(HashKey::Str(Rc::clone(v))),
            other => Err(crate::unusable_hash_key(other.type_name())),
        }
    }

    /// The value this key was made from.
    pub fn to_value(&self) -> Value {
        match self {
            HashKey::Int(v) => Value::Int(*v),
            HashKey::Bool(v) => Value::Bool(*v),
            HashKey::Str(v) => Value::Str(Rc::clone(v)),
        }
    }

    /// Display form (same as the underlying value's).
    pub fn display(&self) -> String {
        match self {
            HashKey::Int(v) => v.to_string(),
            HashKey::Bool(v) => v.to_string(),
            HashKey::Str(v) => v.to_string(),
        }
    }
}

/// Evaluator closure.
///
/// Holds the defining environment by handle (not a frozen snapshot), so
/// a binding added after the literal was evaluated is visible inside
/// the body. That is what makes `let f = fn(n) { f(n) }` recursive.
/// Carries its own arena so the body outlives the parse that produced
/// it.
#[derive(Clone)]
pub struct FunctionValue {
    pub params: ParamRange,
    pub body: StmtRange,
    pub env: Env,
    pub arena: SharedArena,
}

impl FunctionValue {
    pub fn new(params: ParamRange, body: StmtRange, env: Env, arena: SharedArena) -> Self {
        FunctionValue {
            params,
            body,
            env,
            arena,
        }
    }

    /// Number of declared parameters.
    #[inline]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Identity comparison: same body from the same evaluation site.
    pub fn same_closure(&self, other: &FunctionValue) -> bool {
        self.body == other.body && self.env.ptr_eq(&other.env)
    }

    /// `fn(params) { body }` with the body in canonical form.
    pub fn display(&self, names: &dyn StringLookup) -> String {
        let params = self
            .arena
            .params(self.params)
            .iter()
            .map(|&p| names.lookup(p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "fn({}) {{ {} }}",
            params,
            pretty::block_string(self.body, &self.arena, names)
        )
    }
}

impl fmt::Debug for FunctionValue {
    // The environment is omitted: closures stored in the scope they
    // capture would make derived Debug recurse forever.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionValue")
            .field("params", &self.params)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Compiled function body: instructions plus frame layout.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    /// Stack slots to reserve for locals (parameters included).
    pub num_locals: usize,
    pub num_parameters: usize,
}

impl CompiledFunction {
    pub fn new(instructions: Instructions, num_locals: usize, num_parameters: usize) -> Self {
        CompiledFunction {
            instructions,
            num_locals,
            num_parameters,
        }
    }
}

/// VM closure: a compiled function plus its captured free values.
#[derive(Clone, Debug)]
pub struct ClosureValue {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

impl ClosureValue {
    pub fn new(func: Rc<CompiledFunction>, free: Vec<Value>) -> Self {
        ClosureValue { func, free }
    }
}
