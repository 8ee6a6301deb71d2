//! Expression grammar: Pratt parsing.
//!
//! [`Parser::parse_expr`] drives a precedence climb: a prefix rule for
//! the token that begins the expression, then a loop folding infix,
//! call, and index rules while the next token binds tighter than the
//! surrounding context.

use crate::{ParseError, Parser};
use monkey_ir::{BinaryOp, Expr, ExprId, ExprKind, Name, TokenKind, UnaryOp};
use monkey_stack::ensure_sufficient_stack;

/// Operator precedence, low to high.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub(crate) enum Precedence {
    Lowest,
    /// `==`, `!=`
    Equals,
    /// `<`, `>`
    LessGreater,
    /// `+`, `-`
    Sum,
    /// `*`, `/`
    Product,
    /// `-x`, `!x`
    Prefix,
    /// `f(...)`
    Call,
    /// `a[i]`
    Index,
}

/// Precedence of the infix rule a token kind starts, if any.
fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Slash | TokenKind::Asterisk => Precedence::Product,
        TokenKind::LParen => Precedence::Call,
        TokenKind::LBracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

fn binary_op_of(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Asterisk => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        _ => None,
    }
}

impl Parser<'_> {
    /// Parse an expression.
    ///
    /// Wrapped in `ensure_sufficient_stack` so deeply nested input
    /// cannot overflow the OS stack.
    pub(crate) fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        ensure_sufficient_stack(|| self.parse_precedence(Precedence::Lowest))
    }

    /// Parse an expression whose operators must bind tighter than `min`.
    fn parse_precedence(&mut self, min: Precedence) -> Result<ExprId, ParseError> {
        let mut left = self.parse_prefix()?;

        loop {
            let kind = self.cursor.current_kind();
            if precedence_of(kind) <= min {
                break;
            }
            match kind {
                TokenKind::LParen => left = self.parse_call(left)?,
                TokenKind::LBracket => left = self.parse_index(left)?,
                _ => {
                    let Some(op) = binary_op_of(kind) else { break };
                    let prec = precedence_of(kind);
                    self.cursor.advance();
                    let right = self.parse_precedence(prec)?;
                    let span = self
                        .arena
                        .get_expr(left)
                        .span
                        .merge(self.arena.get_expr(right).span);
                    left = self
                        .arena
                        .alloc_expr(Expr::new(ExprKind::Infix { op, left, right }, span));
                }
            }
        }

        Ok(left)
    }

    /// Dispatch on the token that can begin an expression.
    fn parse_prefix(&mut self) -> Result<ExprId, ParseError> {
        let token = self.cursor.current();
        match token.kind {
            TokenKind::Ident(name) => {
                self.cursor.advance();
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Ident(name), token.span)))
            }
            TokenKind::Int(value) => {
                self.cursor.advance();
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Int(value), token.span)))
            }
            TokenKind::Str(name) => {
                self.cursor.advance();
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Str(name), token.span)))
            }
            TokenKind::True => {
                self.cursor.advance();
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Bool(true), token.span)))
            }
            TokenKind::False => {
                self.cursor.advance();
                Ok(self
                    .arena
                    .alloc_expr(Expr::new(ExprKind::Bool(false), token.span)))
            }
            TokenKind::Null => {
                self.cursor.advance();
                Ok(self.arena.alloc_expr(Expr::new(ExprKind::Null, token.span)))
            }
            TokenKind::Bang => self.parse_unary(UnaryOp::Not),
            TokenKind::Minus => self.parse_unary(UnaryOp::Neg),
            TokenKind::LParen => {
                self.cursor.advance();
                let expr = self.parse_precedence(Precedence::Lowest)?;
                self.cursor.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Function => self.parse_function(),
            TokenKind::LBracket => self.parse_array(),
            TokenKind::LBrace => self.parse_hash(),
            _ => Err(self.expected_expression()),
        }
    }

    #[cold]
    #[inline(never)]
    fn expected_expression(&self) -> ParseError {
        ParseError::new(
            format!(
                "expected an expression, found {}",
                self.cursor.current_kind().display_name()
            ),
            self.cursor.current_span(),
        )
    }

    fn parse_unary(&mut self, op: UnaryOp) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        let operand = self.parse_precedence(Precedence::Prefix)?;
        let span = start.merge(self.arena.get_expr(operand).span);
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Prefix { op, operand }, span)))
    }

    /// `if ( <cond> ) <block> (else <block>)?`
    fn parse_if(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        self.cursor.expect(TokenKind::LParen)?;
        let cond = self.parse_precedence(Precedence::Lowest)?;
        self.cursor.expect(TokenKind::RParen)?;
        let consequence = self.parse_block()?;
        let alternative = if self.cursor.check(TokenKind::Else) {
            self.cursor.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        let span = start.merge(self.cursor.previous_span());
        Ok(self.arena.alloc_expr(Expr::new(
            ExprKind::If {
                cond,
                consequence,
                alternative,
            },
            span,
        )))
    }

    /// `fn ( <params> ) <block>`
    fn parse_function(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        self.cursor.expect(TokenKind::LParen)?;
        let mut params: Vec<Name> = Vec::new();
        if !self.cursor.check(TokenKind::RParen) {
            loop {
                let (name, _) = self.cursor.expect_ident()?;
                params.push(name);
                if self.cursor.check(TokenKind::Comma) {
                    self.cursor.advance();
                    if self.cursor.check(TokenKind::RParen) {
                        break; // trailing comma
                    }
                } else {
                    break;
                }
            }
        }
        self.cursor.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        let params = self.arena.alloc_params(&params);
        let span = start.merge(self.cursor.previous_span());
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Function { params, body }, span)))
    }

    /// `<callee> ( <args> )`
    fn parse_call(&mut self, func: ExprId) -> Result<ExprId, ParseError> {
        self.cursor.advance();
        let args = self.parse_expr_list(TokenKind::RParen)?;
        let span = self
            .arena
            .get_expr(func)
            .span
            .merge(self.cursor.previous_span());
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Call { func, args }, span)))
    }

    /// `<left> [ <index> ]`
    fn parse_index(&mut self, left: ExprId) -> Result<ExprId, ParseError> {
        self.cursor.advance();
        let index = self.parse_precedence(Precedence::Lowest)?;
        self.cursor.expect(TokenKind::RBracket)?;
        let span = self
            .arena
            .get_expr(left)
            .span
            .merge(self.cursor.previous_span());
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Index { left, index }, span)))
    }

    /// `[ <elements> ]`
    fn parse_array(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        let elements = self.parse_expr_list(TokenKind::RBracket)?;
        let span = start.merge(self.cursor.previous_span());
        Ok(self
            .arena
            .alloc_expr(Expr::new(ExprKind::Array(elements), span)))
    }

    /// `{ (<key> : <value> ,)* }`, insertion order retained.
    fn parse_hash(&mut self) -> Result<ExprId, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.advance();
        let mut pairs: Vec<(ExprId, ExprId)> = Vec::new();
        if !self.cursor.check(TokenKind::RBrace) {
            loop {
                let key = self.parse_precedence(Precedence::Lowest)?;
                self.cursor.expect(TokenKind::Colon)?;
                let value = self.parse_precedence(Precedence::Lowest)?;
                pairs.push((key, value));
                if self.cursor.check(TokenKind::Comma) {
                    self.cursor.advance();
                    if self.cursor.check(TokenKind::RBrace) {
                        break; // trailing comma
                    }
                } else {
                    break;
                }
            }
        }
        self.cursor.expect(TokenKind::RBrace)?;
        let pairs = self.arena.alloc_pairs(&pairs);
        let span = start.merge(self.cursor.previous_span());
        Ok(self.arena.alloc_expr(Expr::new(ExprKind::Hash(pairs), span)))
    }

    /// Comma-separated expressions up to (and consuming) `close`.
    ///
    /// Children are collected into a scratch vector first so the arena
    /// range stays contiguous despite nested allocations.
    fn parse_expr_list(
        &mut self,
        close: TokenKind,
    ) -> Result<monkey_ir::ExprRange, ParseError> {
        let mut items: Vec<ExprId> = Vec::new();
        if !self.cursor.check(close) {
            loop {
                items.push(self.parse_precedence(Precedence::Lowest)?);
                if self.cursor.check(TokenKind::Comma) {
                    self.cursor.advance();
                    if self.cursor.check(close) {
                        break; // trailing comma
                    }
                } else {
                    break;
                }
            }
        }
        self.cursor.expect(close)?;
        Ok(self.arena.alloc_expr_list(&items))
    }
}
