//! The source-to-value pipeline.

use std::fmt;

use monkey_compile::{CompileError, Compiler};
use monkey_eval::Interpreter;
use monkey_ir::StringInterner;
use monkey_object::Value;
use monkey_parse::{ParseError, ParseOutput};
use monkey_vm::Vm;
use tracing::debug;

/// Which back-end executes the program.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum Backend {
    /// Tree-walking evaluator.
    #[default]
    Eval,
    /// Bytecode compiler + virtual machine.
    Vm,
}

impl Backend {
    /// Parse a `--backend=<name>` flag value.
    pub fn from_flag(name: &str) -> Option<Backend> {
        match name {
            "eval" => Some(Backend::Eval),
            "vm" => Some(Backend::Vm),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Eval => "eval",
            Backend::Vm => "vm",
        }
    }
}

/// Everything that can go wrong between a source string and a value.
#[derive(Debug)]
pub enum RunError {
    /// Static diagnostics; execution never started.
    Parse(Vec<ParseError>),
    /// Name resolution failed during bytecode compilation.
    Compile(CompileError),
    /// The program failed at runtime (either back-end).
    Runtime(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Parse(errors) => {
                writeln!(f, "{} parse error(s):", errors.len())?;
                for error in errors {
                    writeln!(f, "  {error}")?;
                }
                Ok(())
            }
            RunError::Compile(error) => write!(f, "{error}"),
            RunError::Runtime(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for RunError {}

/// Lex and parse a source string.
pub fn parse_source(source: &str, interner: &StringInterner) -> ParseOutput {
    let tokens = monkey_lexer::lex(source, interner);
    monkey_parse::parse(&tokens)
}

/// Run a source string through the chosen back-end with fresh state.
pub fn run_source(
    source: &str,
    interner: &StringInterner,
    backend: Backend,
) -> Result<Value, RunError> {
    let output = parse_source(source, interner);
    if output.has_errors() {
        return Err(RunError::Parse(output.errors));
    }
    debug!(backend = backend.name(), "running program");

    match backend {
        Backend::Eval => {
            let mut interpreter = Interpreter::new(interner, output.arena.clone());
            interpreter
                .eval_program(&output.program)
                .map_err(|error| RunError::Runtime(error.message))
        }
        Backend::Vm => {
            let mut compiler = Compiler::new(interner);
            compiler
                .compile_program(&output.program, &output.arena)
                .map_err(RunError::Compile)?;
            let mut vm = Vm::new(compiler.bytecode(), interner);
            vm.run()
                .map_err(|error| RunError::Runtime(error.message))?;
            Ok(vm.last_popped().clone())
        }
    }
}
