use monkey_code::{make, Instructions, Opcode};
use monkey_ir::StringInterner;
use monkey_object::Value;
use pretty_assertions::assert_eq;

use crate::{Bytecode, Compiler};

fn compile(source: &str) -> Bytecode {
    let interner = StringInterner::new();
    let tokens = monkey_lexer::lex(source, &interner);
    let output = monkey_parse::parse(&tokens);
    assert_eq!(
        output.errors,
        vec![],
        "unexpected parse errors for {source:?}"
    );
    let mut compiler = Compiler::new(&interner);
    compiler
        .compile_program(&output.program, &output.arena)
        .unwrap_or_else(|error| panic!("compile error for {source:?}: {error}"));
    compiler.bytecode()
}

fn concat(parts: &[Vec<u8>]) -> Instructions {
    Instructions::from(parts.concat())
}

#[track_caller]
fn assert_instructions(source: &str, expected: &[Vec<u8>]) {
    let bytecode = compile(source);
    assert_eq!(
        bytecode.instructions.to_string(),
        concat(expected).to_string(),
        "for {source:?}"
    );
}

/// The instructions of constant `index`, which must be a function.
fn function_constant(bytecode: &Bytecode, index: usize) -> String {
    match &bytecode.constants[index] {
        Value::CompiledFunction(f) => f.instructions.to_string(),
        other => panic!("constant {index} is not a function: {other:?}"),
    }
}

#[test]
fn integer_arithmetic() {
    assert_instructions(
        "1 + 2",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Add, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions(
        "1; 2",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Pop, &[]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions(
        "1 - 2",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Sub, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions(
        "-1",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Minus, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_eq!(compile("1 + 2").constants, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn boolean_expressions() {
    assert_instructions("true", &[make(Opcode::True, &[]), make(Opcode::Pop, &[])]);
    assert_instructions(
        "1 > 2",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::GreaterThan, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
    // `<` swaps: the right operand compiles first.
    let bytecode = compile("1 < 2");
    assert_eq!(bytecode.constants, vec![Value::Int(2), Value::Int(1)]);
    assert_instructions(
        "1 < 2",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::GreaterThan, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions(
        "!true",
        &[
            make(Opcode::True, &[]),
            make(Opcode::Bang, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions("null", &[make(Opcode::Null, &[]), make(Opcode::Pop, &[])]);
}

#[test]
fn conditionals_backpatch_jump_targets() {
    assert_instructions(
        "if (true) { 10 }; 3333;",
        &[
            // 0000
            make(Opcode::True, &[]),
            // 0001
            make(Opcode::JumpIfNotTruthy, &[10]),
            // 0004
            make(Opcode::Constant, &[0]),
            // 0007
            make(Opcode::Jump, &[11]),
            // 0010
            make(Opcode::Null, &[]),
            // 0011
            make(Opcode::Pop, &[]),
            // 0012
            make(Opcode::Constant, &[1]),
            // 0015
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions(
        "if (true) { 10 } else { 20 }; 3333;",
        &[
            make(Opcode::True, &[]),
            make(Opcode::JumpIfNotTruthy, &[10]),
            make(Opcode::Constant, &[0]),
            make(Opcode::Jump, &[13]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Pop, &[]),
            make(Opcode::Constant, &[2]),
            make(Opcode::Pop, &[]),
        ],
    );
}

#[test]
fn global_let_statements() {
    assert_instructions(
        "let one = 1; let two = 2;",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::SetGlobal, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::SetGlobal, &[1]),
        ],
    );
    assert_instructions(
        "let one = 1; one;",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::SetGlobal, &[0]),
            make(Opcode::GetGlobal, &[0]),
            make(Opcode::Pop, &[]),
        ],
    );
}

#[test]
fn undefined_variables_fail_to_compile() {
    let interner = StringInterner::new();
    let tokens = monkey_lexer::lex("ghost;", &interner);
    let output = monkey_parse::parse(&tokens);
    let mut compiler = Compiler::new(&interner);
    let error = compiler
        .compile_program(&output.program, &output.arena)
        .unwrap_err();
    assert_eq!(error.message, "undefined variable: ghost");
}

#[test]
fn string_expressions() {
    let bytecode = compile("\"mon\" + \"key\"");
    assert_eq!(
        bytecode.constants,
        vec![Value::string("mon"), Value::string("key")]
    );
    assert_instructions(
        "\"mon\" + \"key\"",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Add, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
}

#[test]
fn array_literals() {
    assert_instructions("[]", &[make(Opcode::Array, &[0]), make(Opcode::Pop, &[])]);
    assert_instructions(
        "[1, 2, 3]",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Constant, &[2]),
            make(Opcode::Array, &[3]),
            make(Opcode::Pop, &[]),
        ],
    );
}

#[test]
fn hash_literals() {
    assert_instructions("{}", &[make(Opcode::Hash, &[0]), make(Opcode::Pop, &[])]);
    assert_instructions(
        "{1: 2, 3: 4, 5: 6}",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Constant, &[2]),
            make(Opcode::Constant, &[3]),
            make(Opcode::Constant, &[4]),
            make(Opcode::Constant, &[5]),
            make(Opcode::Hash, &[6]),
            make(Opcode::Pop, &[]),
        ],
    );
}

#[test]
fn index_expressions() {
    assert_instructions(
        "[1, 2][1]",
        &[
            make(Opcode::Constant, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Array, &[2]),
            make(Opcode::Constant, &[2]),
            make(Opcode::Index, &[]),
            make(Opcode::Pop, &[]),
        ],
    );
}

#[test]
fn functions_return_their_tail_value() {
    let bytecode = compile("fn() { return 5 + 10 }");
    let expected = concat(&[
        make(Opcode::Constant, &[0]),
        make(Opcode::Constant, &[1]),
        make(Opcode::Add, &[]),
        make(Opcode::ReturnValue, &[]),
    ]);
    assert_eq!(function_constant(&bytecode, 2), expected.to_string());

    // Implicit tail value: the trailing Pop becomes ReturnValue.
    let implicit = compile("fn() { 5 + 10 }");
    assert_eq!(function_constant(&implicit, 2), expected.to_string());

    assert_instructions(
        "fn() { 5 + 10 }",
        &[make(Opcode::Closure, &[2, 0]), make(Opcode::Pop, &[])],
    );
}

#[test]
fn empty_function_body_compiles_to_return() {
    let bytecode = compile("fn() { }");
    assert_eq!(
        function_constant(&bytecode, 0),
        concat(&[make(Opcode::Return, &[])]).to_string()
    );
}

#[test]
fn function_calls() {
    assert_instructions(
        "fn() { 24 }();",
        &[
            make(Opcode::Closure, &[1, 0]),
            make(Opcode::Call, &[0]),
            make(Opcode::Pop, &[]),
        ],
    );
    assert_instructions(
        "let oneArg = fn(a) { a }; oneArg(24);",
        &[
            make(Opcode::Closure, &[0, 0]),
            make(Opcode::SetGlobal, &[0]),
            make(Opcode::GetGlobal, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Call, &[1]),
            make(Opcode::Pop, &[]),
        ],
    );
    let bytecode = compile("let oneArg = fn(a) { a }; oneArg(24);");
    assert_eq!(
        function_constant(&bytecode, 0),
        concat(&[make(Opcode::GetLocal, &[0]), make(Opcode::ReturnValue, &[])]).to_string()
    );
}

#[test]
fn let_statement_scopes() {
    let bytecode = compile("let num = 55; fn() { num }");
    assert_eq!(
        function_constant(&bytecode, 1),
        concat(&[make(Opcode::GetGlobal, &[0]), make(Opcode::ReturnValue, &[])]).to_string()
    );

    let bytecode = compile("fn() { let num = 55; num }");
    assert_eq!(
        function_constant(&bytecode, 1),
        concat(&[
            make(Opcode::Constant, &[0]),
            make(Opcode::SetLocal, &[0]),
            make(Opcode::GetLocal, &[0]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );

    let bytecode = compile("fn() { let a = 55; let b = 77; a + b }");
    assert_eq!(
        function_constant(&bytecode, 2),
        concat(&[
            make(Opcode::Constant, &[0]),
            make(Opcode::SetLocal, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::SetLocal, &[1]),
            make(Opcode::GetLocal, &[0]),
            make(Opcode::GetLocal, &[1]),
            make(Opcode::Add, &[]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
}

#[test]
fn builtins_compile_to_table_indices() {
    assert_instructions(
        "len([]); push([], 1);",
        &[
            make(Opcode::GetBuiltin, &[0]),
            make(Opcode::Array, &[0]),
            make(Opcode::Call, &[1]),
            make(Opcode::Pop, &[]),
            make(Opcode::GetBuiltin, &[5]),
            make(Opcode::Array, &[0]),
            make(Opcode::Constant, &[0]),
            make(Opcode::Call, &[2]),
            make(Opcode::Pop, &[]),
        ],
    );
    let bytecode = compile("fn() { len([]) }");
    assert_eq!(
        function_constant(&bytecode, 0),
        concat(&[
            make(Opcode::GetBuiltin, &[0]),
            make(Opcode::Array, &[0]),
            make(Opcode::Call, &[1]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
}

#[test]
fn closures_capture_free_variables() {
    let bytecode = compile("fn(a) { fn(b) { a + b } }");
    // Inner function: `a` is free, `b` is local.
    assert_eq!(
        function_constant(&bytecode, 0),
        concat(&[
            make(Opcode::GetFree, &[0]),
            make(Opcode::GetLocal, &[0]),
            make(Opcode::Add, &[]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
    // Outer function loads `a` before building the inner closure.
    assert_eq!(
        function_constant(&bytecode, 1),
        concat(&[
            make(Opcode::GetLocal, &[0]),
            make(Opcode::Closure, &[0, 1]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
    assert_instructions(
        "fn(a) { fn(b) { a + b } }",
        &[make(Opcode::Closure, &[1, 0]), make(Opcode::Pop, &[])],
    );
}

#[test]
fn deeply_nested_closures_chain_free_loads() {
    let bytecode = compile("fn(a) { fn(b) { fn(c) { a + b + c } } }");
    assert_eq!(
        function_constant(&bytecode, 0),
        concat(&[
            make(Opcode::GetFree, &[0]),
            make(Opcode::GetFree, &[1]),
            make(Opcode::Add, &[]),
            make(Opcode::GetLocal, &[0]),
            make(Opcode::Add, &[]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
    assert_eq!(
        function_constant(&bytecode, 1),
        concat(&[
            make(Opcode::GetFree, &[0]),
            make(Opcode::GetLocal, &[0]),
            make(Opcode::Closure, &[0, 2]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
    assert_eq!(
        function_constant(&bytecode, 2),
        concat(&[
            make(Opcode::GetLocal, &[0]),
            make(Opcode::Closure, &[1, 1]),
            make(Opcode::ReturnValue, &[]),
        ])
        .to_string()
    );
}

#[test]
fn repl_state_survives_across_programs() {
    let interner = StringInterner::new();

    let tokens = monkey_lexer::lex("let x = 7;", &interner);
    let first = monkey_parse::parse(&tokens);
    let mut compiler = Compiler::new(&interner);
    compiler
        .compile_program(&first.program, &first.arena)
        .unwrap_or_else(|e| panic!("{e}"));
    let (symbols, constants) = compiler.into_state();

    let tokens = monkey_lexer::lex("x + 1;", &interner);
    let second = monkey_parse::parse(&tokens);
    let mut compiler = Compiler::with_state(&interner, symbols, constants);
    compiler
        .compile_program(&second.program, &second.arena)
        .unwrap_or_else(|e| panic!("{e}"));
    let bytecode = compiler.bytecode();

    // `x` still resolves to global slot 0; the constant pool keeps
    // growing from the first line.
    assert_eq!(
        bytecode.instructions.to_string(),
        concat(&[
            make(Opcode::GetGlobal, &[0]),
            make(Opcode::Constant, &[1]),
            make(Opcode::Add, &[]),
            make(Opcode::Pop, &[]),
        ])
        .to_string()
    );
    assert_eq!(bytecode.constants, vec![Value::Int(7), Value::Int(1)]);
}
