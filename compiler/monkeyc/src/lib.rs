//! Driver library for the `monkey` binary.
//!
//! Thin glue over the pipeline crates: read a string, lex, parse, then
//! either evaluate or compile-and-run, and hand the resulting value (or
//! error) to the caller. The REPL and the CLI commands both build on
//! [`pipeline`].

pub mod pipeline;
pub mod repl;
pub mod tracing_setup;

pub use pipeline::{parse_source, run_source, Backend, RunError};
