//! Monkey CLI.
//!
//! `monkey` with no arguments starts the REPL. `run`, `parse`, and
//! `lex` operate on files; `--backend=eval|vm` selects the execution
//! back-end where it applies.

use monkey_ir::StringInterner;
use monkey_object::Value;
use monkeyc::{parse_source, run_source, tracing_setup, Backend, RunError};

fn main() {
    tracing_setup::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        repl(Backend::default());
        return;
    }

    let command = &args[1];
    let backend = backend_from(&args);

    match command.as_str() {
        "repl" => repl(backend),
        "run" => {
            let Some(path) = file_arg(&args) else {
                eprintln!("Usage: monkey run <file.monkey> [--backend=eval|vm]");
                std::process::exit(1);
            };
            run_file(&path, backend);
        }
        "parse" => {
            let Some(path) = file_arg(&args) else {
                eprintln!("Usage: monkey parse <file.monkey>");
                std::process::exit(1);
            };
            parse_file(&path);
        }
        "lex" => {
            let Some(path) = file_arg(&args) else {
                eprintln!("Usage: monkey lex <file.monkey>");
                std::process::exit(1);
            };
            lex_file(&path);
        }
        "disasm" => {
            let Some(path) = file_arg(&args) else {
                eprintln!("Usage: monkey disasm <file.monkey>");
                std::process::exit(1);
            };
            disasm_file(&path);
        }
        "help" | "--help" | "-h" => print_usage(),
        "version" | "--version" | "-V" => {
            println!("monkey {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // Shorthand: a .monkey path runs directly.
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("monkey"))
            {
                run_file(command, backend);
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("The Monkey programming language");
    println!();
    println!("Usage: monkey [command] [options]");
    println!();
    println!("Commands:");
    println!("  repl                 Start an interactive session (default)");
    println!("  run <file.monkey>    Run a program");
    println!("  parse <file.monkey>  Parse and report statement counts and errors");
    println!("  lex <file.monkey>    Tokenize and display tokens");
    println!("  disasm <file.monkey> Compile and display bytecode");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --backend=<name>     Execution back-end: eval (default), vm");
    println!();
    println!("Examples:");
    println!("  monkey");
    println!("  monkey run fib.monkey --backend=vm");
    println!("  monkey fib.monkey    (shorthand for 'run')");
}

/// The `--backend=` flag, anywhere in the arguments.
fn backend_from(args: &[String]) -> Backend {
    for arg in args {
        if let Some(name) = arg.strip_prefix("--backend=") {
            match Backend::from_flag(name) {
                Some(backend) => return backend,
                None => {
                    eprintln!("Unknown backend: {name} (expected eval or vm)");
                    std::process::exit(1);
                }
            }
        }
    }
    Backend::default()
}

/// First non-flag argument after the command.
fn file_arg(args: &[String]) -> Option<String> {
    args.iter()
        .skip(2)
        .find(|arg| !arg.starts_with('-'))
        .cloned()
}

fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("Error reading '{path}': {error}");
            std::process::exit(1);
        }
    }
}

fn repl(backend: Backend) {
    if let Err(error) = monkeyc::repl::start(backend) {
        eprintln!("REPL I/O error: {error}");
        std::process::exit(1);
    }
}

fn run_file(path: &str, backend: Backend) {
    let source = read_file(path);
    let interner = StringInterner::new();
    match run_source(&source, &interner, backend) {
        Ok(Value::Null) => {}
        Ok(value) => println!("{}", value.display(&interner)),
        Err(RunError::Parse(errors)) => {
            eprintln!("Parse errors in '{path}':");
            for error in &errors {
                eprintln!("  {error}");
            }
            std::process::exit(1);
        }
        Err(error) => {
            eprintln!("ERROR: {error}");
            std::process::exit(1);
        }
    }
}

fn parse_file(path: &str) {
    let source = read_file(path);
    let interner = StringInterner::new();
    let output = parse_source(&source, &interner);

    println!("Parse result for '{path}':");
    println!("  Statements: {}", output.program.len());
    println!("  Expressions: {}", output.arena.expr_count());
    println!("  Errors: {}", output.errors.len());

    if !output.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &output.errors {
            println!("  {error}");
        }
        std::process::exit(1);
    }
}

fn lex_file(path: &str) {
    let source = read_file(path);
    let interner = StringInterner::new();
    let tokens = monkey_lexer::lex(&source, &interner);

    println!("Tokens for '{path}' ({} tokens):", tokens.len());
    for token in &tokens {
        println!("  {:?} @ {}", token.kind, token.span);
    }
}

fn disasm_file(path: &str) {
    let source = read_file(path);
    let interner = StringInterner::new();
    let output = parse_source(&source, &interner);
    if !output.errors.is_empty() {
        eprintln!("Parse errors in '{path}':");
        for error in &output.errors {
            eprintln!("  {error}");
        }
        std::process::exit(1);
    }

    let mut compiler = monkey_compile::Compiler::new(&interner);
    if let Err(error) = compiler.compile_program(&output.program, &output.arena) {
        eprintln!("ERROR: {error}");
        std::process::exit(1);
    }
    let bytecode = compiler.bytecode();

    println!("Constants ({}):", bytecode.constants.len());
    for (index, constant) in bytecode.constants.iter().enumerate() {
        match constant {
            Value::CompiledFunction(function) => {
                println!("  {index}: fn ({} locals)", function.num_locals);
                for line in function.instructions.to_string().lines() {
                    println!("       {line}");
                }
            }
            other => println!("  {index}: {}", other.display(&interner)),
        }
    }
    println!();
    println!("Instructions:");
    print!("{}", bytecode.instructions);
}
