//! Single-pass bytecode compiler for Monkey.
//!
//! Lowers the AST into a flat instruction stream over a constants pool.
//! Control flow is emitted with placeholder jump targets and
//! back-patched once the branch lengths are known. Function literals
//! compile in their own scope; free variables resolve through the
//! symbol table and are loaded onto the stack right before the
//! `Closure` instruction that captures them.

mod symbol_table;

#[cfg(test)]
mod tests;

pub use symbol_table::{Symbol, SymbolScope, SymbolTable};

use std::fmt;
use std::rc::Rc;

use monkey_code::{make, Instructions, Opcode};
use monkey_ir::{
    BinaryOp, ExprArena, ExprId, ExprKind, Program, Span, Stmt, StmtKind, StmtRange,
    StringInterner, UnaryOp,
};
use monkey_object::{CompiledFunction, Value};
use tracing::debug;

/// Compilation result: instructions plus the constants they index.
#[derive(Clone, Debug)]
pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

/// Compile-time error (name resolution is the only source today).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileError {
    pub message: String,
    pub span: Span,
}

impl CompileError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        CompileError {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for CompileError {}

/// Record of an emitted instruction, for peephole decisions.
#[derive(Copy, Clone, Debug)]
struct EmittedInstruction {
    opcode: Opcode,
    position: usize,
}

/// Per-function instruction accumulator.
#[derive(Default)]
struct CompilationScope {
    instructions: Instructions,
    last: Option<EmittedInstruction>,
    previous: Option<EmittedInstruction>,
}

/// Compiler state.
///
/// The symbol table and constants pool survive [`Compiler::into_state`]
/// so a REPL can carry bindings across lines.
pub struct Compiler<'a> {
    interner: &'a StringInterner,
    constants: Vec<Value>,
    scopes: Vec<CompilationScope>,
    symbol_table: SymbolTable,
}

impl<'a> Compiler<'a> {
    /// Create a compiler with a fresh global scope and the builtins
    /// pre-defined.
    pub fn new(interner: &'a StringInterner) -> Self {
        Self::with_state(interner, SymbolTable::with_builtins(interner), Vec::new())
    }

    /// Create a compiler continuing from existing state (REPL lines).
    pub fn with_state(
        interner: &'a StringInterner,
        symbol_table: SymbolTable,
        constants: Vec<Value>,
    ) -> Self {
        Compiler {
            interner,
            constants,
            scopes: vec![CompilationScope::default()],
            symbol_table,
        }
    }

    /// Compile a program into the current scope.
    pub fn compile_program(
        &mut self,
        program: &Program,
        arena: &ExprArena,
    ) -> Result<(), CompileError> {
        debug!(stmts = program.len(), "compile start");
        for stmt in arena.stmts(program.stmts) {
            self.compile_stmt(stmt, arena)?;
        }
        Ok(())
    }

    /// Snapshot the compiled bytecode.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.scopes[0].instructions.clone(),
            constants: self.constants.clone(),
        }
    }

    /// Give back the symbol table and constants for the next REPL line.
    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    // ── statements ──────────────────────────────────────────────────────

    fn compile_stmt(&mut self, stmt: &Stmt, arena: &ExprArena) -> Result<(), CompileError> {
        match stmt.kind {
            StmtKind::Let { name, value } => {
                // Define before compiling the value so a global function
                // can refer to itself.
                let symbol = self.symbol_table.define(name);
                self.compile_expr(value, arena)?;
                match symbol.scope {
                    SymbolScope::Global => self.emit(Opcode::SetGlobal, &[symbol.index]),
                    _ => self.emit(Opcode::SetLocal, &[symbol.index]),
                };
                Ok(())
            }
            StmtKind::Return { value } => {
                match value {
                    Some(id) => self.compile_expr(id, arena)?,
                    None => {
                        self.emit(Opcode::Null, &[]);
                    }
                }
                self.emit(Opcode::ReturnValue, &[]);
                Ok(())
            }
            StmtKind::Expr(id) => {
                self.compile_expr(id, arena)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
        }
    }

    /// Compile a block whose value stays on the stack: the trailing
    /// expression-statement `Pop` is stripped, and an empty block
    /// produces `null`.
    fn compile_block_value(
        &mut self,
        range: StmtRange,
        arena: &ExprArena,
    ) -> Result<(), CompileError> {
        let before = self.current_scope().instructions.len();
        for stmt in arena.stmts(range) {
            self.compile_stmt(stmt, arena)?;
        }
        if self.last_instruction_is(Opcode::Pop) {
            self.remove_last_instruction();
        } else if self.current_scope().instructions.len() == before {
            self.emit(Opcode::Null, &[]);
        }
        Ok(())
    }

    // ── expressions ─────────────────────────────────────────────────────

    fn compile_expr(&mut self, id: ExprId, arena: &ExprArena) -> Result<(), CompileError> {
        let expr = *arena.get_expr(id);
        match expr.kind {
            ExprKind::Int(value) => {
                let index = self.add_constant(Value::Int(value));
                self.emit(Opcode::Constant, &[index]);
            }
            ExprKind::Str(name) => {
                let index = self.add_constant(Value::string(self.interner.lookup(name)));
                self.emit(Opcode::Constant, &[index]);
            }
            ExprKind::Bool(true) => {
                self.emit(Opcode::True, &[]);
            }
            ExprKind::Bool(false) => {
                self.emit(Opcode::False, &[]);
            }
            ExprKind::Null => {
                self.emit(Opcode::Null, &[]);
            }
            ExprKind::Ident(name) => {
                let Some(symbol) = self.symbol_table.resolve(name) else {
                    return Err(CompileError::new(
                        format!("undefined variable: {}", self.interner.lookup(name)),
                        expr.span,
                    ));
                };
                self.load_symbol(symbol);
            }
            ExprKind::Prefix { op, operand } => {
                self.compile_expr(operand, arena)?;
                match op {
                    UnaryOp::Neg => self.emit(Opcode::Minus, &[]),
                    UnaryOp::Not => self.emit(Opcode::Bang, &[]),
                };
            }
            ExprKind::Infix { op, left, right } => {
                // Only GreaterThan exists; `<` swaps its operands, the
                // right one compiling first.
                if op == BinaryOp::Lt {
                    self.compile_expr(right, arena)?;
                    self.compile_expr(left, arena)?;
                    self.emit(Opcode::GreaterThan, &[]);
                } else {
                    self.compile_expr(left, arena)?;
                    self.compile_expr(right, arena)?;
                    self.emit(binary_opcode(op), &[]);
                }
            }
            ExprKind::If {
                cond,
                consequence,
                alternative,
            } => {
                self.compile_expr(cond, arena)?;
                let jump_not_truthy = self.emit(Opcode::JumpIfNotTruthy, &[PLACEHOLDER]);

                self.compile_block_value(consequence, arena)?;
                let jump_over_else = self.emit(Opcode::Jump, &[PLACEHOLDER]);

                let else_start = self.current_scope().instructions.len();
                self.change_operand(jump_not_truthy, else_start);

                match alternative {
                    Some(alternative) => self.compile_block_value(alternative, arena)?,
                    None => {
                        self.emit(Opcode::Null, &[]);
                    }
                }
                let after_else = self.current_scope().instructions.len();
                self.change_operand(jump_over_else, after_else);
            }
            ExprKind::Function { params, body } => {
                self.enter_scope();
                for &param in arena.params(params) {
                    self.symbol_table.define(param);
                }
                for stmt in arena.stmts(body) {
                    self.compile_stmt(stmt, arena)?;
                }
                // The body's tail value is the return value: a trailing
                // expression-statement `Pop` becomes `ReturnValue`; a
                // body that produced nothing returns null via `Return`.
                if self.last_instruction_is(Opcode::Pop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(Opcode::ReturnValue) {
                    self.emit(Opcode::Return, &[]);
                }

                let free = self.symbol_table.free_symbols().to_vec();
                let num_locals = self.symbol_table.num_definitions();
                let instructions = self.leave_scope();

                for &symbol in &free {
                    self.load_symbol(symbol);
                }
                let function = CompiledFunction::new(instructions, num_locals, params.len());
                let index = self.add_constant(Value::CompiledFunction(Rc::new(function)));
                self.emit(Opcode::Closure, &[index, free.len()]);
            }
            ExprKind::Call { func, args } => {
                self.compile_expr(func, arena)?;
                let arg_ids = arena.expr_list(args);
                for &arg in arg_ids {
                    self.compile_expr(arg, arena)?;
                }
                self.emit(Opcode::Call, &[arg_ids.len()]);
            }
            ExprKind::Index { left, index } => {
                self.compile_expr(left, arena)?;
                self.compile_expr(index, arena)?;
                self.emit(Opcode::Index, &[]);
            }
            ExprKind::Array(elements) => {
                let element_ids = arena.expr_list(elements);
                for &element in element_ids {
                    self.compile_expr(element, arena)?;
                }
                self.emit(Opcode::Array, &[element_ids.len()]);
            }
            ExprKind::Hash(pairs) => {
                let pair_ids = arena.pairs(pairs);
                for &(key, value) in pair_ids {
                    self.compile_expr(key, arena)?;
                    self.compile_expr(value, arena)?;
                }
                self.emit(Opcode::Hash, &[pair_ids.len() * 2]);
            }
        }
        Ok(())
    }

    // ── emission machinery ──────────────────────────────────────────────

    /// Append an instruction, returning its starting offset.
    fn emit(&mut self, op: Opcode, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let scope = self.current_scope_mut();
        let position = scope.instructions.push_instruction(&instruction);
        scope.previous = scope.last;
        scope.last = Some(EmittedInstruction {
            opcode: op,
            position,
        });
        position
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn last_instruction_is(&self, op: Opcode) -> bool {
        self.current_scope()
            .last
            .is_some_and(|last| last.opcode == op)
    }

    /// Drop the last emitted instruction (strip a trailing `Pop`).
    fn remove_last_instruction(&mut self) {
        let scope = self.current_scope_mut();
        if let Some(last) = scope.last {
            scope.instructions.truncate(last.position);
            scope.last = scope.previous;
            scope.previous = None;
        }
    }

    /// Rewrite a trailing `Pop` into `ReturnValue` in place (both are
    /// one byte wide).
    fn replace_last_pop_with_return(&mut self) {
        let scope = self.current_scope_mut();
        if let Some(last) = scope.last {
            if last.opcode == Opcode::Pop {
                scope
                    .instructions
                    .replace_at(last.position, &make(Opcode::ReturnValue, &[]));
                scope.last = Some(EmittedInstruction {
                    opcode: Opcode::ReturnValue,
                    position: last.position,
                });
            }
        }
    }

    /// Back-patch the operand of a previously emitted instruction.
    fn change_operand(&mut self, position: usize, operand: usize) {
        let scope = self.current_scope_mut();
        let byte = scope.instructions.bytes()[position];
        let op = Opcode::from_byte(byte)
            .unwrap_or_else(|| unreachable!("patching a non-opcode byte at {position}"));
        scope.instructions.replace_at(position, &make(op, &[operand]));
    }

    fn load_symbol(&mut self, symbol: Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Opcode::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Opcode::GetLocal, &[symbol.index]),
            SymbolScope::Free => self.emit(Opcode::GetFree, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Opcode::GetBuiltin, &[symbol.index]),
        };
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        let outer = std::mem::take(&mut self.symbol_table);
        self.symbol_table = SymbolTable::enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| unreachable!("leave_scope without enter_scope"));
        let table = std::mem::take(&mut self.symbol_table);
        self.symbol_table = table.into_outer();
        scope.instructions
    }

    #[inline]
    fn current_scope(&self) -> &CompilationScope {
        self.scopes
            .last()
            .unwrap_or_else(|| unreachable!("compiler scope stack is never empty"))
    }

    #[inline]
    fn current_scope_mut(&mut self) -> &mut CompilationScope {
        self.scopes
            .last_mut()
            .unwrap_or_else(|| unreachable!("compiler scope stack is never empty"))
    }
}

/// Placeholder operand for jumps that get back-patched.
const PLACEHOLDER: usize = 0xFFFF;

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::Gt => Opcode::GreaterThan,
        BinaryOp::Eq => Opcode::Equal,
        BinaryOp::NotEq => Opcode::NotEqual,
        BinaryOp::Lt => unreachable!("`<` compiles as a swapped GreaterThan"),
    }
}
