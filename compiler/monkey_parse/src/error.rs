//! Parse error types.

use monkey_ir::Span;
use std::fmt;

/// A recoverable parser diagnostic.
///
/// The parser never aborts: errors accumulate in a list and parsing
/// resumes at the next statement boundary. Callers must check the list
/// before handing the program to a back-end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable message.
    pub message: String,
    /// Where in the source the error was detected.
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

impl std::error::Error for ParseError {}
