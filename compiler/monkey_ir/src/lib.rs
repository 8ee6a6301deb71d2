//! Shared IR types for the Monkey compiler.
//!
//! Everything both ends of the pipeline agree on lives here: source spans,
//! interned names, tokens, and the flat AST the parser produces and the
//! evaluator and bytecode compiler consume.

mod arena;
mod ast;
mod interner;
mod name;
pub mod pretty;
mod span;
mod token;

pub use arena::{ExprArena, SharedArena};
pub use ast::{
    BinaryOp, Expr, ExprId, ExprKind, ExprRange, PairRange, ParamRange, Program, Stmt, StmtKind,
    StmtRange, UnaryOp,
};
pub use interner::{SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use span::Span;
pub use token::{Token, TokenKind, TokenList};
