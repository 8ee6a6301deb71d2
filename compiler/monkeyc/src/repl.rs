//! Interactive read-eval-print loop.
//!
//! One interner for the whole session. The eval back-end carries a
//! single environment across lines; the VM back-end carries the symbol
//! table, constants pool, and globals array, so earlier bindings stay
//! visible either way. Parser errors print per line; runtime failures
//! print as `ERROR: <message>`; neither ends the session.

use std::io::{self, BufRead, Write};

use monkey_compile::{Compiler, SymbolTable};
use monkey_eval::Interpreter;
use monkey_ir::SharedInterner;
use monkey_object::{Env, Value};
use monkey_vm::{Vm, GLOBALS_SIZE};

use crate::pipeline::{parse_source, Backend};

const PROMPT: &str = ">> ";

/// Start the REPL on stdin/stdout.
pub fn start(backend: Backend) -> io::Result<()> {
    let user = std::env::var("USER").unwrap_or_else(|_| "there".to_string());
    println!("Hello {user}! This is the Monkey programming language!");
    println!("Feel free to type in commands.");

    match backend {
        Backend::Eval => eval_loop(),
        Backend::Vm => vm_loop(),
    }
}

fn eval_loop() -> io::Result<()> {
    let interner = SharedInterner::new();
    let env = Env::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        let output = parse_source(&line, &interner);
        if output.has_errors() {
            for error in &output.errors {
                println!("parser error: {error}");
            }
            continue;
        }

        let mut interpreter = Interpreter::with_env(&interner, output.arena.clone(), env.clone());
        match interpreter.eval_program(&output.program) {
            Ok(value) => println!("{}", value.display(&*interner)),
            Err(error) => println!("ERROR: {error}"),
        }
    }
    Ok(())
}

fn vm_loop() -> io::Result<()> {
    let interner = SharedInterner::new();
    let mut symbols = SymbolTable::with_builtins(&interner);
    let mut constants: Vec<Value> = Vec::new();
    let mut globals = vec![Value::Null; GLOBALS_SIZE];
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{PROMPT}");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;

        let output = parse_source(&line, &interner);
        if output.has_errors() {
            for error in &output.errors {
                println!("parser error: {error}");
            }
            continue;
        }

        let mut compiler = Compiler::with_state(&interner, symbols, constants);
        let compiled = compiler.compile_program(&output.program, &output.arena);
        let bytecode = compiler.bytecode();
        // The table and pool come back even after an error, so the next
        // line continues from the same session state.
        (symbols, constants) = compiler.into_state();
        if let Err(error) = compiled {
            println!("ERROR: {error}");
            continue;
        }

        let mut vm = Vm::with_globals(bytecode, &interner, std::mem::take(&mut globals));
        match vm.run() {
            Ok(()) => println!("{}", vm.last_popped().display(&*interner)),
            Err(error) => println!("ERROR: {error}"),
        }
        globals = vm.into_globals();
    }
    Ok(())
}
