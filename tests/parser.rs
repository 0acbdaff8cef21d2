use pretty_assertions::assert_eq;

use rox::ast_printer::AstPrinter;
use rox::expr::Expr;
use rox::parser::{Parsed, Parser};
use rox::scanner::Scanner;
use rox::stmt::Stmt;

fn parse(source: &str) -> Parsed {
    let scanned = Scanner::scan_all(source);
    assert!(scanned.errors.is_empty(), "lex errors: {:?}", scanned.errors);
    Parser::new(scanned.tokens).parse()
}

fn print_expression(source: &str) -> String {
    let scanned = Scanner::scan_all(source);
    let expr = Parser::new(scanned.tokens)
        .parse_expression()
        .expect("expression should parse");
    AstPrinter::print(&expr)
}

#[test]
fn prints_prefix_form_with_precedence() {
    assert_eq!(
        print_expression("-123 * (45.67)"),
        "(* (- 123.0) (group 45.67))"
    );
    assert_eq!(print_expression("1 + 2 * 3 == 7"), "(== (+ 1.0 (* 2.0 3.0)) 7.0)");
    assert_eq!(print_expression("a or b and c"), "(or a (and b c))");
}

#[test]
fn prints_calls_properties_and_assignment() {
    assert_eq!(print_expression("f(1, x)"), "(call f 1.0 x)");
    assert_eq!(print_expression("a.b.c = 3"), "(= c (. b a) 3.0)");
    assert_eq!(print_expression("x = y = 2"), "(= x (= y 2.0))");
}

#[test]
fn trailing_tokens_after_expression_are_rejected() {
    let scanned = Scanner::scan_all("1 2");
    let err = Parser::new(scanned.tokens).parse_expression().unwrap_err();

    assert_eq!(err.to_string(), "[line 1] Error at '2': Expect end of expression.");
}

#[test]
fn for_loop_desugars_to_block_and_while() {
    let parsed = parse("for (var i = 0; i < 3; i = i + 1) print i;");

    assert!(!parsed.has_errors());
    let [Stmt::Block(outer)] = parsed.statements.as_slice() else {
        panic!("expected a single block, got {:?}", parsed.statements);
    };
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected a while loop, got {:?}", outer[1]);
    };
    let Stmt::Block(inner) = &**body else {
        panic!("expected the body plus increment, got {:?}", body);
    };
    assert!(matches!(inner[0], Stmt::Print { .. }));
    assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn class_with_superclass_and_methods() {
    let parsed = parse("class B < A { init(x) { this.x = x; } get() { return super.get(); } }");

    assert!(!parsed.has_errors());
    let [Stmt::Class {
        name,
        superclass: Some(Expr::Variable { name: super_name, .. }),
        methods,
    }] = parsed.statements.as_slice()
    else {
        panic!("expected a subclass declaration, got {:?}", parsed.statements);
    };

    assert_eq!(name.lexeme, "B");
    assert_eq!(super_name.lexeme, "A");
    let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, vec!["init", "get"]);
    assert_eq!(methods[0].params.len(), 1);
}

#[test]
fn failed_declarations_become_placeholders_and_parsing_continues() {
    let parsed = parse("var = 1;\nprint 2;\nprint ;\nprint 3;");

    let messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 3] Error at ';': Expect expression.",
        ]
    );

    assert_eq!(parsed.statements.len(), 4);
    assert!(matches!(parsed.statements[0], Stmt::Invalid));
    assert!(matches!(parsed.statements[1], Stmt::Print { .. }));
    assert!(matches!(parsed.statements[2], Stmt::Invalid));
    assert!(matches!(parsed.statements[3], Stmt::Print { .. }));
}

#[test]
fn invalid_assignment_target_is_reported() {
    let parsed = parse("1 + 2 = 3;");

    assert_eq!(parsed.errors.len(), 1);
    assert_eq!(
        parsed.errors[0].to_string(),
        "[line 1] Error at '=': Invalid assignment target."
    );
}

#[test]
fn missing_semicolon_at_end_of_input() {
    let parsed = parse("print 1");

    assert_eq!(
        parsed.errors[0].to_string(),
        "[line 1] Error at end: Expect ';' after value."
    );
}
