//! Tree-walking evaluator for Monkey.
//!
//! A single dispatcher over AST variants. Runtime errors are values on
//! the `Err` channel and short-circuit through `?`; `return` rides the
//! same channel as a control-flow signal and is unwrapped exactly at
//! function and program boundaries.

mod operators;


pub use operators::{evaluate_binary, evaluate_unary};

use monkey_ir::{
    ExprId, ExprKind, PairRange, Program, SharedArena, Stmt, StmtKind, StmtRange, StringInterner,
};
use monkey_object::{
    builtin_by_name, identifier_not_found, index_not_supported, not_a_function,
    wrong_number_of_arguments, ControlFlow, Env, EvalError, EvalResult, FunctionValue, FxIndexMap,
    HashKey, Value,
};
use monkey_stack::ensure_sufficient_stack;

/// Tree-walking interpreter.
///
/// Holds the interner for name lookups, the arena the current program
/// lives in, and the environment bindings accumulate in. Function calls
/// evaluate the callee's body against the callee's own arena (closures
/// may come from an earlier parse, e.g. a previous REPL line).
pub struct Interpreter<'a> {
    interner: &'a StringInterner,
    arena: SharedArena,
    pub env: Env,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter with a fresh environment.
    pub fn new(interner: &'a StringInterner, arena: SharedArena) -> Self {
        Self::with_env(interner, arena, Env::new())
    }

    /// Create an interpreter over an existing environment (REPL reuse).
    pub fn with_env(interner: &'a StringInterner, arena: SharedArena, env: Env) -> Self {
        Interpreter {
            interner,
            arena,
            env,
        }
    }

    /// Evaluate a program.
    ///
    /// Statements run in order; a `return` signal terminates the
    /// program and unwraps to its value; the first error wins.
    pub fn eval_program(&mut self, program: &Program) -> EvalResult {
        let arena = self.arena.clone();
        let mut result = Value::Null;
        for &stmt in arena.stmts(program.stmts) {
            match self.eval_stmt(stmt) {
                Ok(value) => result = value,
                Err(EvalError {
                    control_flow: Some(ControlFlow::Return(value)),
                    ..
                }) => return Ok(value),
                Err(error) => return Err(error),
            }
        }
        Ok(result)
    }

    fn eval_stmt(&mut self, stmt: Stmt) -> EvalResult {
        match stmt.kind {
            StmtKind::Let { name, value } => {
                let value = self.eval_expr(value)?;
                self.env.define(name, value);
                Ok(Value::Null)
            }
            StmtKind::Return { value } => {
                let value = match value {
                    Some(id) => self.eval_expr(id)?,
                    None => Value::Null,
                };
                Err(EvalError::return_with(value))
            }
            StmtKind::Expr(id) => self.eval_expr(id),
        }
    }

    /// Evaluate a block without unwrapping `return`, so the signal
    /// tunnels out of nested blocks to the function boundary.
    fn eval_block(&mut self, range: StmtRange) -> EvalResult {
        let arena = self.arena.clone();
        let mut result = Value::Null;
        for &stmt in arena.stmts(range) {
            result = self.eval_stmt(stmt)?;
        }
        Ok(result)
    }

    fn eval_expr(&mut self, id: ExprId) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(id))
    }

    fn eval_expr_inner(&mut self, id: ExprId) -> EvalResult {
        let expr = *self.arena.get_expr(id);
        match expr.kind {
            ExprKind::Int(value) => Ok(Value::Int(value)),
            ExprKind::Bool(value) => Ok(Value::Bool(value)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Str(name) => Ok(Value::string(self.interner.lookup(name))),
            ExprKind::Ident(name) => self.resolve_ident(name),
            ExprKind::Prefix { op, operand } => {
                let value = self.eval_expr(operand)?;
                evaluate_unary(op, value)
            }
            ExprKind::Infix { op, left, right } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                evaluate_binary(left, op, right)
            }
            ExprKind::If {
                cond,
                consequence,
                alternative,
            } => {
                let cond = self.eval_expr(cond)?;
                if cond.is_truthy() {
                    self.eval_block(consequence)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative)
                } else {
                    Ok(Value::Null)
                }
            }
            ExprKind::Function { params, body } => Ok(Value::Function(FunctionValue::new(
                params,
                body,
                self.env.clone(),
                self.arena.clone(),
            ))),
            ExprKind::Call { func, args } => {
                let callee = self.eval_expr(func)?;
                let arena = self.arena.clone();
                let mut evaluated = Vec::with_capacity(args.len());
                for &arg in arena.expr_list(args) {
                    evaluated.push(self.eval_expr(arg)?);
                }
                self.apply_function(callee, evaluated)
            }
            ExprKind::Index { left, index } => {
                let left = self.eval_expr(left)?;
                let index = self.eval_expr(index)?;
                eval_index(&left, &index)
            }
            ExprKind::Array(elements) => {
                let arena = self.arena.clone();
                let mut items = Vec::with_capacity(elements.len());
                for &element in arena.expr_list(elements) {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::array(items))
            }
            ExprKind::Hash(pairs) => self.eval_hash(pairs),
        }
    }

    fn resolve_ident(&self, name: monkey_ir::Name) -> EvalResult {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        let text = self.interner.lookup(name);
        builtin_by_name(text)
            .map(Value::Builtin)
            .ok_or_else(|| identifier_not_found(text))
    }

    fn eval_hash(&mut self, pairs: PairRange) -> EvalResult {
        let arena = self.arena.clone();
        let mut entries = FxIndexMap::default();
        for &(key, value) in arena.pairs(pairs) {
            let key = self.eval_expr(key)?;
            let key = HashKey::from_value(&key)?;
            let value = self.eval_expr(value)?;
            entries.insert(key, value);
        }
        Ok(Value::hash(entries))
    }

    /// Invoke a callable with already-evaluated arguments.
    fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> EvalResult {
        match callee {
            Value::Function(function) => {
                if function.param_count() != args.len() {
                    return Err(wrong_number_of_arguments(
                        function.param_count(),
                        args.len(),
                    ));
                }
                // Fresh scope per call, enclosed by the *captured*
                // environment, not the caller's.
                let call_env = Env::enclosed(function.env.clone());
                for (&param, value) in function.arena.params(function.params).iter().zip(args) {
                    call_env.define(param, value);
                }
                let mut callee_interp =
                    Interpreter::with_env(self.interner, function.arena.clone(), call_env);
                match callee_interp.eval_block(function.body) {
                    Err(EvalError {
                        control_flow: Some(ControlFlow::Return(value)),
                        ..
                    }) => Ok(value),
                    other => other,
                }
            }
            Value::Builtin(builtin) => (builtin.func)(&args, self.interner),
            other => Err(not_a_function(other.type_name())),
        }
    }
}

/// Index a collection.
///
/// Array indices may be negative (from the end); out of range yields
/// null. Hash misses yield null; unhashable keys are errors.
fn eval_index(left: &Value, index: &Value) -> EvalResult {
    match (left, index) {
        (Value::Array(items), Value::Int(i)) => Ok(array_index(items, *i)),
        (Value::Hash(entries), key) => {
            let key = HashKey::from_value(key)?;
            Ok(entries.get(&key).cloned().unwrap_or(Value::Null))
        }
        (other, _) => Err(index_not_supported(other.type_name())),
    }
}

fn array_index(items: &[Value], index: i64) -> Value {
    let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let effective = if index < 0 { len + index } else { index };
    usize::try_from(effective)
        .ok()
        .and_then(|i| items.get(i).cloned())
        .unwrap_or(Value::Null)
}
