use monkey_ir::{
    pretty, ExprKind, Program, SharedArena, StmtKind, StringInterner,
};
use pretty_assertions::assert_eq;

use crate::{parse, ParseOutput};

struct Parsed {
    interner: StringInterner,
    output: ParseOutput,
}

fn parse_source(source: &str) -> Parsed {
    let interner = StringInterner::new();
    let tokens = monkey_lexer::lex(source, &interner);
    let output = parse(&tokens);
    Parsed { interner, output }
}

fn parse_clean(source: &str) -> Parsed {
    let parsed = parse_source(source);
    assert_eq!(parsed.output.errors, vec![], "unexpected parse errors for {source:?}");
    parsed
}

fn render(parsed: &Parsed) -> String {
    pretty::program_string(&parsed.output.program, &parsed.output.arena, &parsed.interner)
}

fn program_stmts(parsed: &Parsed) -> (&Program, &SharedArena) {
    (&parsed.output.program, &parsed.output.arena)
}

#[test]
fn let_statements() {
    let parsed = parse_clean("let x = 5;\nlet y = 10;\nlet foobar = 838383;\n");
    let (program, arena) = program_stmts(&parsed);
    assert_eq!(program.len(), 3);

    let expected = ["x", "y", "foobar"];
    for (stmt, expected_name) in arena.stmts(program.stmts).iter().zip(expected) {
        let StmtKind::Let { name, .. } = stmt.kind else {
            panic!("expected a let statement, got {:?}", stmt.kind);
        };
        assert_eq!(parsed.interner.lookup(name), expected_name);
    }
}

#[test]
fn let_statement_errors_recover_per_statement() {
    let parsed = parse_source("let x 5;\nlet = 10;\nlet 838383;\n");
    assert_eq!(parsed.output.errors.len(), 3);
}

#[test]
fn error_does_not_hide_later_statements() {
    let parsed = parse_source("let x 5; let y = 7;");
    assert_eq!(parsed.output.errors.len(), 1);
    let (program, arena) = program_stmts(&parsed);
    assert_eq!(program.len(), 1);
    let StmtKind::Let { name, .. } = arena.stmts(program.stmts)[0].kind else {
        panic!("expected a let statement");
    };
    assert_eq!(parsed.interner.lookup(name), "y");
}

#[test]
fn return_statements() {
    let parsed = parse_clean("return 5;\nreturn 10;\nreturn 993322;\nreturn;\n");
    let (program, arena) = program_stmts(&parsed);
    assert_eq!(program.len(), 4);

    let stmts = arena.stmts(program.stmts);
    for stmt in &stmts[..3] {
        assert!(matches!(stmt.kind, StmtKind::Return { value: Some(_) }));
    }
    assert!(matches!(stmts[3].kind, StmtKind::Return { value: None }));
}

#[test]
fn literal_expressions() {
    let parsed = parse_clean("foobar; 5; true; false; null; \"hello\";");
    let (program, arena) = program_stmts(&parsed);
    let kinds: Vec<ExprKind> = arena
        .stmts(program.stmts)
        .iter()
        .map(|stmt| {
            let StmtKind::Expr(id) = stmt.kind else {
                panic!("expected expression statement");
            };
            arena.get_expr(id).kind
        })
        .collect();

    assert!(matches!(kinds[0], ExprKind::Ident(_)));
    assert_eq!(kinds[1], ExprKind::Int(5));
    assert_eq!(kinds[2], ExprKind::Bool(true));
    assert_eq!(kinds[3], ExprKind::Bool(false));
    assert_eq!(kinds[4], ExprKind::Null);
    assert!(matches!(kinds[5], ExprKind::Str(_)));
}

#[test]
fn operator_precedence_rendering() {
    let cases = [
        ("-a * b", "((-a) * b)"),
        ("!-a", "(!(-a))"),
        ("a + b + c", "((a + b) + c)"),
        ("a + b - c", "((a + b) - c)"),
        ("a * b * c", "((a * b) * c)"),
        ("a * b / c", "((a * b) / c)"),
        ("a + b / c", "(a + (b / c))"),
        ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f)"),
        ("3 + 4; -5 * 5", "(3 + 4)((-5) * 5)"),
        ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4))"),
        ("5 < 4 != 3 > 4", "((5 < 4) != (3 > 4))"),
        (
            "3 + 4 * 5 == 3 * 1 + 4 * 5",
            "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)))",
        ),
        ("true", "true"),
        ("3 > 5 == false", "((3 > 5) == false)"),
        ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4)"),
        ("(5 + 5) * 2", "((5 + 5) * 2)"),
        ("2 / (5 + 5)", "(2 / (5 + 5))"),
        ("-(5 + 5)", "(-(5 + 5))"),
        ("!(true == true)", "(!(true == true))"),
        ("a + add(b * c) + d", "((a + add((b * c))) + d)"),
        (
            "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
            "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)))",
        ),
        ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g))"),
        (
            "a * [1, 2, 3, 4][b * c] * d",
            "((a * ([1, 2, 3, 4][(b * c)])) * d)",
        ),
        (
            "add(a * b[2], b[1], 2 * [1, 2][1])",
            "add((a * (b[2])), (b[1]), (2 * ([1, 2][1])))",
        ),
    ];
    for (source, expected) in cases {
        let parsed = parse_clean(source);
        assert_eq!(render(&parsed), expected, "for source {source:?}");
    }
}

#[test]
fn if_expression() {
    let parsed = parse_clean("if (x < y) { x }");
    let (program, arena) = program_stmts(&parsed);
    let StmtKind::Expr(id) = arena.stmts(program.stmts)[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::If {
        consequence,
        alternative,
        ..
    } = arena.get_expr(id).kind
    else {
        panic!("expected if expression");
    };
    assert_eq!(consequence.len(), 1);
    assert!(alternative.is_none());
    assert_eq!(render(&parsed), "if ((x < y)) { x }");
}

#[test]
fn if_else_expression() {
    let parsed = parse_clean("if (x < y) { x } else { y }");
    assert_eq!(render(&parsed), "if ((x < y)) { x } else { y }");
}

#[test]
fn function_literal() {
    let parsed = parse_clean("fn(x, y) { x + y; }");
    let (program, arena) = program_stmts(&parsed);
    let StmtKind::Expr(id) = arena.stmts(program.stmts)[0].kind else {
        panic!("expected expression statement");
    };
    let ExprKind::Function { params, body } = arena.get_expr(id).kind else {
        panic!("expected function literal");
    };
    let names: Vec<&str> = arena
        .params(params)
        .iter()
        .map(|&p| parsed.interner.lookup(p))
        .collect();
    assert_eq!(names, vec!["x", "y"]);
    assert_eq!(body.len(), 1);
    assert_eq!(render(&parsed), "fn(x, y) { (x + y) }");
}

#[test]
fn function_parameter_lists() {
    let cases: [(&str, &[&str]); 4] = [
        ("fn() {};", &[]),
        ("fn(x) {};", &["x"]),
        ("fn(x, y, z) {};", &["x", "y", "z"]),
        ("fn(x, y,) {};", &["x", "y"]),
    ];
    for (source, expected) in cases {
        let parsed = parse_clean(source);
        let (program, arena) = program_stmts(&parsed);
        let StmtKind::Expr(id) = arena.stmts(program.stmts)[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Function { params, .. } = arena.get_expr(id).kind else {
            panic!("expected function literal");
        };
        let names: Vec<&str> = arena
            .params(params)
            .iter()
            .map(|&p| parsed.interner.lookup(p))
            .collect();
        assert_eq!(names, expected, "for source {source:?}");
    }
}

#[test]
fn call_expression() {
    let parsed = parse_clean("add(1, 2 * 3, 4 + 5);");
    assert_eq!(render(&parsed), "add(1, (2 * 3), (4 + 5))");
}

#[test]
fn array_and_index() {
    let parsed = parse_clean("[1, 2 * 2, 3 + 3]");
    assert_eq!(render(&parsed), "[1, (2 * 2), (3 + 3)]");

    let parsed = parse_clean("myArray[1 + 1]");
    assert_eq!(render(&parsed), "(myArray[(1 + 1)])");

    let parsed = parse_clean("[]");
    assert_eq!(render(&parsed), "[]");
}

#[test]
fn hash_literals_preserve_insertion_order() {
    let parsed = parse_clean("{\"one\": 1, \"two\": 2, \"three\": 3}");
    assert_eq!(render(&parsed), "{\"one\": 1, \"two\": 2, \"three\": 3}");

    let parsed = parse_clean("{}");
    assert_eq!(render(&parsed), "{}");

    let parsed = parse_clean("{1: 0 + 1, 2: 10 - 8, 3: 15 / 5}");
    assert_eq!(render(&parsed), "{1: (0 + 1), 2: (10 - 8), 3: (15 / 5)}");
}

#[test]
fn unclosed_delimiters_are_errors() {
    for source in ["(1 + 2", "[1, 2", "{1: 2", "fn(x { x }", "if (x { 1 }"] {
        let parsed = parse_source(source);
        assert!(parsed.output.has_errors(), "expected errors for {source:?}");
    }
}

#[test]
fn rendering_is_idempotent_under_reparse() {
    let sources = [
        "let x = 5; let y = x + 2; y;",
        "if (a < b) { a } else { b }",
        "let adder = fn(x) { fn(y) { x + y } };",
        "[1, \"two\", true, null][2]",
        "{\"k\": [1, 2], 3: fn(a) { a }}",
        "!-a + b * c == d",
        "let s = \"line\\nbreak \\\"quoted\\\"\";",
    ];
    for source in sources {
        let first = parse_clean(source);
        let once = render(&first);
        let second = parse_clean(&once);
        let twice = render(&second);
        assert_eq!(once, twice, "for source {source:?}");
    }
}
