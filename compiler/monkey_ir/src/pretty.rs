//! Canonical AST rendering.
//!
//! Produces the deterministic, parenthesized form used by parser tests
//! and by function display: infix as `(left op right)`, prefix as
//! `(opright)`, blocks as the concatenation of statement strings. The
//! output re-parses to the same tree, so rendering is idempotent under
//! parse → render → parse.

use std::fmt::Write;

use crate::ast::{ExprId, ExprKind, Program, Stmt, StmtKind, StmtRange};
use crate::{ExprArena, StringLookup};

/// Render a whole program.
pub fn program_string(program: &Program, arena: &ExprArena, names: &dyn StringLookup) -> String {
    block_string(program.stmts, arena, names)
}

/// Render a statement range as the concatenation of its statements.
pub fn block_string(range: StmtRange, arena: &ExprArena, names: &dyn StringLookup) -> String {
    let mut out = String::new();
    for stmt in arena.stmts(range) {
        out.push_str(&stmt_string(stmt, arena, names));
    }
    out
}

/// Render a single statement.
pub fn stmt_string(stmt: &Stmt, arena: &ExprArena, names: &dyn StringLookup) -> String {
    match stmt.kind {
        StmtKind::Let { name, value } => {
            format!(
                "let {} = {};",
                names.lookup(name),
                expr_string(value, arena, names)
            )
        }
        StmtKind::Return { value: Some(value) } => {
            format!("return {};", expr_string(value, arena, names))
        }
        StmtKind::Return { value: None } => "return;".to_string(),
        StmtKind::Expr(expr) => expr_string(expr, arena, names),
    }
}

/// Render a single expression.
pub fn expr_string(id: ExprId, arena: &ExprArena, names: &dyn StringLookup) -> String {
    let expr = arena.get_expr(id);
    match expr.kind {
        ExprKind::Int(value) => value.to_string(),
        ExprKind::Bool(value) => value.to_string(),
        ExprKind::Str(name) => {
            let mut out = String::from('"');
            escape_into(&mut out, names.lookup(name));
            out.push('"');
            out
        }
        ExprKind::Null => "null".to_string(),
        ExprKind::Ident(name) => names.lookup(name).to_string(),
        ExprKind::Prefix { op, operand } => {
            format!("({}{})", op.as_str(), expr_string(operand, arena, names))
        }
        ExprKind::Infix { op, left, right } => {
            format!(
                "({} {} {})",
                expr_string(left, arena, names),
                op.as_str(),
                expr_string(right, arena, names)
            )
        }
        ExprKind::If {
            cond,
            consequence,
            alternative,
        } => {
            let mut out = format!(
                "if ({}) {{ {} }}",
                expr_string(cond, arena, names),
                block_string(consequence, arena, names)
            );
            if let Some(alt) = alternative {
                let _ = write!(out, " else {{ {} }}", block_string(alt, arena, names));
            }
            out
        }
        ExprKind::Function { params, body } => {
            let params = arena
                .params(params)
                .iter()
                .map(|&p| names.lookup(p))
                .collect::<Vec<_>>()
                .join(", ");
            format!("fn({}) {{ {} }}", params, block_string(body, arena, names))
        }
        ExprKind::Call { func, args } => {
            let args = arena
                .expr_list(args)
                .iter()
                .map(|&a| expr_string(a, arena, names))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{}({})", expr_string(func, arena, names), args)
        }
        ExprKind::Index { left, index } => {
            format!(
                "({}[{}])",
                expr_string(left, arena, names),
                expr_string(index, arena, names)
            )
        }
        ExprKind::Array(elements) => {
            let elements = arena
                .expr_list(elements)
                .iter()
                .map(|&e| expr_string(e, arena, names))
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{elements}]")
        }
        ExprKind::Hash(pairs) => {
            let pairs = arena
                .pairs(pairs)
                .iter()
                .map(|&(k, v)| {
                    format!(
                        "{}: {}",
                        expr_string(k, arena, names),
                        expr_string(v, arena, names)
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{pairs}}}")
        }
    }
}

/// Re-escape string-literal content so the rendering re-parses.
fn escape_into(out: &mut String, content: &str) {
    for ch in content.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
}
