//! Pratt parser for Monkey.
//!
//! Consumes a `TokenList`, produces a [`monkey_ir::Program`] over a flat
//! arena plus a list of recoverable diagnostics. The parser never
//! aborts: on a structural mismatch it records an error, synchronizes to
//! the next statement boundary, and keeps going, so one bad statement
//! doesn't hide the rest of the file.

mod cursor;
mod error;
mod grammar;
mod recovery;

#[cfg(test)]
mod tests;

pub use error::ParseError;
pub use recovery::{synchronize, TokenSet, BLOCK_BOUNDARY, STMT_BOUNDARY};

pub(crate) use cursor::Cursor;

use monkey_ir::{ExprArena, Program, SharedArena, Stmt, TokenList};
use tracing::debug;

/// Parser state.
pub struct Parser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) arena: ExprArena,
    pub(crate) errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser over a token stream.
    pub fn new(tokens: &'a TokenList) -> Self {
        // Estimate source size for pre-allocation (~4 bytes per token).
        let estimated_source_len = tokens.len() * 4;
        Parser {
            cursor: Cursor::new(tokens),
            arena: ExprArena::with_capacity(estimated_source_len),
            errors: Vec::new(),
        }
    }

    /// Parse the whole program.
    ///
    /// Always returns a program; inspect [`ParseOutput::errors`] before
    /// evaluating or compiling it.
    pub fn parse_program(mut self) -> ParseOutput {
        debug!(token_count = self.cursor.token_count(), "parse start");

        let mut stmts: Vec<Stmt> = Vec::new();
        while !self.cursor.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.errors.push(error);
                    recovery::synchronize(&mut self.cursor, STMT_BOUNDARY);
                    self.eat_semicolon();
                }
            }
        }

        let stmts = self.arena.alloc_stmts(&stmts);
        ParseOutput {
            program: Program { stmts },
            arena: SharedArena::new(self.arena),
            errors: self.errors,
        }
    }
}

/// Result of parsing: the program, its arena, and any diagnostics.
pub struct ParseOutput {
    pub program: Program,
    pub arena: SharedArena,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    /// Whether any diagnostics were recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Parse a token stream into a program.
pub fn parse(tokens: &TokenList) -> ParseOutput {
    Parser::new(tokens).parse_program()
}
