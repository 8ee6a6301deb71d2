//! Arena allocation for the flat AST.
//!
//! All nodes of one parse live in contiguous vectors; children reference
//! each other by id or by range into a flattened side table. Ranges must
//! be allocated contiguously, so the parser collects children into
//! scratch vectors and copies them in one go.

use std::fmt;
use std::sync::Arc;

use crate::ast::{Expr, ExprId, ExprRange, PairRange, ParamRange, Stmt, StmtRange};
use crate::Name;

/// Panic helper for capacity overflow (cold path).
#[cold]
#[inline(never)]
fn panic_capacity_exceeded(value: usize, context: &str) -> ! {
    panic!("arena capacity exceeded: {context} has {value} elements, max is {}", u32::MAX)
}

#[inline]
fn to_u32(value: usize, context: &str) -> u32 {
    u32::try_from(value).unwrap_or_else(|_| panic_capacity_exceeded(value, context))
}

/// Contiguous storage for all nodes of one parse.
#[derive(Clone, Default)]
pub struct ExprArena {
    /// All expressions (indexed by `ExprId`).
    exprs: Vec<Expr>,
    /// All statements (referenced by `StmtRange`).
    stmts: Vec<Stmt>,
    /// Flattened expression lists (call args, array elements).
    expr_lists: Vec<ExprId>,
    /// Function parameter names.
    params: Vec<Name>,
    /// Hash literal key/value pairs, insertion order preserved.
    pairs: Vec<(ExprId, ExprId)>,
}

impl ExprArena {
    /// Create a new empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with estimated capacity based on source size.
    /// Heuristic: ~1 expression per 8 bytes of source.
    pub fn with_capacity(source_len: usize) -> Self {
        let estimated = source_len / 8;
        ExprArena {
            exprs: Vec::with_capacity(estimated),
            stmts: Vec::with_capacity(estimated / 4),
            expr_lists: Vec::with_capacity(estimated / 4),
            params: Vec::with_capacity(estimated / 8),
            pairs: Vec::with_capacity(estimated / 8),
        }
    }

    /// Allocate an expression, returning its id.
    #[inline]
    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    /// Get an expression by id.
    #[inline]
    pub fn get_expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Copy a slice of statements into the arena as one contiguous range.
    pub fn alloc_stmts(&mut self, stmts: &[Stmt]) -> StmtRange {
        let start = to_u32(self.stmts.len(), "statements");
        self.stmts.extend_from_slice(stmts);
        StmtRange {
            start,
            len: to_u32(stmts.len(), "statement range"),
        }
    }

    /// Get the statements of a range.
    #[inline]
    pub fn stmts(&self, range: StmtRange) -> &[Stmt] {
        &self.stmts[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Copy an expression list into the arena as one contiguous range.
    pub fn alloc_expr_list(&mut self, ids: &[ExprId]) -> ExprRange {
        let start = to_u32(self.expr_lists.len(), "expression lists");
        self.expr_lists.extend_from_slice(ids);
        ExprRange {
            start,
            len: to_u32(ids.len(), "expression list"),
        }
    }

    /// Get the ids of an expression list range.
    #[inline]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        &self.expr_lists[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Copy a parameter-name list into the arena.
    pub fn alloc_params(&mut self, names: &[Name]) -> ParamRange {
        let start = to_u32(self.params.len(), "parameters");
        self.params.extend_from_slice(names);
        ParamRange {
            start,
            len: to_u32(names.len(), "parameter list"),
        }
    }

    /// Get the parameter names of a range.
    #[inline]
    pub fn params(&self, range: ParamRange) -> &[Name] {
        &self.params[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Copy a key/value pair list into the arena.
    pub fn alloc_pairs(&mut self, pairs: &[(ExprId, ExprId)]) -> PairRange {
        let start = to_u32(self.pairs.len(), "pairs");
        self.pairs.extend_from_slice(pairs);
        PairRange {
            start,
            len: to_u32(pairs.len(), "pair list"),
        }
    }

    /// Get the key/value pairs of a range.
    #[inline]
    pub fn pairs(&self, range: PairRange) -> &[(ExprId, ExprId)] {
        &self.pairs[range.start as usize..range.start as usize + range.len as usize]
    }

    /// Total number of allocated expressions.
    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

impl fmt::Debug for ExprArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExprArena")
            .field("exprs", &self.exprs.len())
            .field("stmts", &self.stmts.len())
            .finish_non_exhaustive()
    }
}

/// Shared, immutable arena handle.
///
/// Closures hold a `SharedArena` so their bodies stay resolvable after
/// the parse that produced them (e.g. across REPL lines).
#[derive(Clone)]
pub struct SharedArena(Arc<ExprArena>);

impl SharedArena {
    pub fn new(arena: ExprArena) -> Self {
        SharedArena(Arc::new(arena))
    }
}

impl std::ops::Deref for SharedArena {
    type Target = ExprArena;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SharedArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}
