//! Statement and block grammar.
//!
//! Expression parsing lives in [`expr`]; this module handles the three
//! statement forms and brace-delimited blocks, including per-statement
//! error recovery inside blocks.

mod expr;

use crate::recovery::{synchronize, BLOCK_BOUNDARY};
use crate::{ParseError, Parser};
use monkey_ir::{Stmt, StmtKind, StmtRange, TokenKind};

impl Parser<'_> {
    /// Parse a single statement.
    pub(crate) fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.cursor.current_kind() {
            TokenKind::Let => self.parse_let_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            _ => self.parse_expr_stmt(),
        }
    }

    /// `let <ident> = <expr> ;?`
    fn parse_let_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        let (name, _) = self.cursor.expect_ident()?;
        self.cursor.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        let span = start.merge(self.arena.get_expr(value).span);
        self.eat_semicolon();
        Ok(Stmt::new(StmtKind::Let { name, value }, span))
    }

    /// `return <expr>? ;?`
    fn parse_return_stmt(&mut self) -> Result<Stmt, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        let value = if starts_expression(self.cursor.current_kind()) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = match value {
            Some(id) => start.merge(self.arena.get_expr(id).span),
            None => start,
        };
        self.eat_semicolon();
        Ok(Stmt::new(StmtKind::Return { value }, span))
    }

    /// Bare expression with an optional trailing semicolon.
    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        let span = self.arena.get_expr(expr).span;
        self.eat_semicolon();
        Ok(Stmt::new(StmtKind::Expr(expr), span))
    }

    /// `{ <stmt>* }`, recovering per statement so one bad statement
    /// doesn't lose the rest of the block.
    pub(crate) fn parse_block(&mut self) -> Result<StmtRange, ParseError> {
        self.cursor.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while !self.cursor.check(TokenKind::RBrace) && !self.cursor.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    self.errors.push(error);
                    if !synchronize(&mut self.cursor, BLOCK_BOUNDARY) {
                        break;
                    }
                    self.eat_semicolon();
                }
            }
        }
        self.cursor.expect(TokenKind::RBrace)?;
        Ok(self.arena.alloc_stmts(&stmts))
    }

    #[inline]
    pub(crate) fn eat_semicolon(&mut self) {
        if self.cursor.check(TokenKind::Semicolon) {
            self.cursor.advance();
        }
    }
}

/// Whether a token can begin an expression (the prefix-parse set).
fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_)
            | TokenKind::Int(_)
            | TokenKind::Str(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Bang
            | TokenKind::Minus
            | TokenKind::LParen
            | TokenKind::If
            | TokenKind::Function
            | TokenKind::LBracket
            | TokenKind::LBrace
    )
}
