//! Lexer for Monkey.
//!
//! Hand-written scanner over the source bytes: main dispatch on the
//! current byte, one byte of lookahead for the compound operators
//! (`==`, `!=`). Identifiers and string literals are interned as they
//! are scanned; integer literals are parsed here; escape sequences are
//! cooked here. Error conditions surface as `TokenKind::Illegal`
//! tokens, never as panics.

mod keywords;
mod scanner;


use monkey_ir::{StringInterner, TokenKind, TokenList};
use scanner::Scanner;

/// Tokenize a source string.
///
/// The returned list is always terminated by a single `Eof` token, even
/// for empty input.
pub fn lex(source: &str, interner: &StringInterner) -> TokenList {
    let mut scanner = Scanner::new(source, interner);
    // Heuristic: ~1 token per 4 bytes of source, plus the EOF.
    let mut tokens = TokenList::with_capacity(source.len() / 4 + 1);
    loop {
        let token = scanner.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    tokens
}
