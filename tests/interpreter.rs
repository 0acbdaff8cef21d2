mod common;

use std::io::{self, Write};

use pretty_assertions::assert_eq;

use common::{output_of, run, runtime_error, session};
use rox::session::{Outcome, Session};

#[test]
fn arithmetic_and_printing() {
    assert_eq!(
        output_of("print 1 + 2 * 3; print (1 + 2) * 3; print 7 / 2; print -3 - -4; print 10 / 4;"),
        vec!["7", "9", "3.5", "1", "2.5"]
    );
}

#[test]
fn division_by_zero_is_not_an_error() {
    assert_eq!(
        output_of("print 1 / 0; print -1 / 0; print 0 / 0 == 0 / 0;"),
        vec!["Infinity", "-Infinity", "false"]
    );
}

#[test]
fn string_concatenation() {
    assert_eq!(
        output_of(r#"var a = "foo"; var b = "bar"; print a + b; print "" + "";"#),
        vec!["foobar", ""]
    );
}

#[test]
fn truthiness_and_logic() {
    assert_eq!(
        output_of(
            r#"
            print !nil;
            print !0;
            print !"";
            print nil or "default";
            print 0 and "zero is truthy";
            print false and missing;
            print true or missing;
            "#
        ),
        vec!["true", "false", "false", "default", "zero is truthy", "false", "true"]
    );
}

#[test]
fn equality_never_fails() {
    assert_eq!(
        output_of(
            r#"
            print nil == nil;
            print nil == 0;
            print nil == false;
            print "a" == "a";
            print 1 == "1";
            print 1 != 2;
            "#
        ),
        vec!["true", "false", "false", "true", "false", "true"]
    );
}

#[test]
fn functions_and_classes_compare_by_identity() {
    assert_eq!(
        output_of(
            r#"
            fun f() {}
            var g = f;
            print f == g;
            class A {}
            var a = A();
            var b = A();
            print a == a;
            print a == b;
            print clock == clock;
            "#
        ),
        vec!["true", "true", "false", "true"]
    );
}

#[test]
fn blocks_shadow_and_restore() {
    assert_eq!(
        output_of("var a = 1; { var a = 2; print a; } print a;"),
        vec!["2", "1"]
    );
}

#[test]
fn uninitialized_variables_are_nil() {
    assert_eq!(output_of("var a; print a;"), vec!["nil"]);
}

#[test]
fn control_flow() {
    assert_eq!(
        output_of(
            r#"
            if (1 > 2) print "no"; else print "yes";
            var i = 0;
            while (i < 3) { print i; i = i + 1; }
            for (var j = 0; j < 2; j = j + 1) print j;
            "#
        ),
        vec!["yes", "0", "1", "2", "0", "1"]
    );
}

#[test]
fn for_loop_variable_is_scoped_to_the_loop() {
    let (message, lines) = runtime_error("for (var k = 0; k < 1; k = k + 1) {} print k;");

    assert_eq!(message, "Undefined variable 'k'.\n[line 1]");
    assert!(lines.is_empty());
}

#[test]
fn recursion_and_early_return() {
    assert_eq!(
        output_of(
            r#"
            fun fib(n) {
              if (n < 2) return n;
              return fib(n - 1) + fib(n - 2);
            }
            print fib(15);

            fun first(n) {
              while (true) {
                if (n > 3) return n;
                n = n + 1;
              }
            }
            print first(0);

            fun nothing() { return; }
            print nothing();
            "#
        ),
        vec!["610", "4", "nil"]
    );
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!(
        output_of(
            r#"
            fun makeCounter() {
              var count = 0;
              fun inc() {
                count = count + 1;
                return count;
              }
              return inc;
            }
            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
            print a;
            "#
        ),
        vec!["1", "2", "1", "<fn inc>"]
    );
}

#[test]
fn resolved_binding_ignores_later_shadowing() {
    assert_eq!(
        output_of(
            r#"
            var a = "global";
            {
              fun show() { print a; }
              show();
              var a = "block";
              show();
            }
            "#
        ),
        vec!["global", "global"]
    );
}

#[test]
fn classes_fields_and_methods() {
    assert_eq!(
        output_of(
            r#"
            class Point {
              init(x, y) { this.x = x; this.y = y; }
              sum() { return this.x + this.y; }
            }
            var p = Point(1, 2);
            print p.sum();
            p.x = 10;
            print p.sum();
            print Point;
            print p;
            var m = p.sum;
            print m();
            "#
        ),
        vec!["3", "12", "Point", "Point instance", "12"]
    );
}

#[test]
fn inherited_initializer_runs_for_subclass() {
    assert_eq!(
        output_of(
            "class A { init(x) { this.x = x; } get() { return this.x; } } \
             class B < A {} var b = B(5); print b.get();"
        ),
        vec!["5"]
    );
}

#[test]
fn initializer_always_yields_the_instance() {
    assert_eq!(
        output_of(
            r#"
            class C {
              init() { this.v = 1; return; }
            }
            var c = C();
            print c;
            print c.init();
            print c.v;
            "#
        ),
        vec!["C instance", "C instance", "1"]
    );
}

#[test]
fn super_calls_reach_the_superclass_method() {
    assert_eq!(
        output_of(
            r#"
            class A { say() { return "A"; } }
            class B < A { say() { return "B" + super.say(); } }
            class C < B { say() { return "C" + super.say(); } }
            print C().say();
            "#
        ),
        vec!["CBA"]
    );
}

#[test]
fn fields_shadow_methods() {
    assert_eq!(
        output_of(
            r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = "field";
            print a.m;
            "#
        ),
        vec!["field"]
    );
}

#[test]
fn native_clock_returns_a_number() {
    assert_eq!(
        output_of("var t = clock(); print t > 0; print t == t; print clock;"),
        vec!["true", "true", "<native fn>"]
    );
}

#[test]
fn runtime_errors_render_message_and_line() {
    let cases = [
        ("print -\"a\";", "Operand must be a number.\n[line 1]"),
        ("print 1 < \"a\";", "Operands must be numbers.\n[line 1]"),
        ("print 1 + nil;", "Operands must be two numbers or two strings.\n[line 1]"),
        ("\nprint missing;", "Undefined variable 'missing'.\n[line 2]"),
        ("missing = 1;", "Undefined variable 'missing'.\n[line 1]"),
        ("\"str\"();", "Can only call functions and classes.\n[line 1]"),
        ("fun f(a, b) {} f(1);", "Expected 2 arguments but got 1.\n[line 1]"),
        ("fun f(a, b) {} f(1, 2, 3);", "Expected 2 arguments but got 3.\n[line 1]"),
        ("class A {} A(1);", "Expected 0 arguments but got 1.\n[line 1]"),
        ("print 3.x;", "Only instances have properties.\n[line 1]"),
        ("var s = \"s\"; s.x = 1;", "Only instances have fields.\n[line 1]"),
        ("class A {} print A().nope;", "Undefined property 'nope'.\n[line 1]"),
        ("var NotClass = 1; class B < NotClass {}", "Superclass must be a class.\n[line 1]"),
    ];

    for (source, expected) in cases {
        let (message, _) = runtime_error(source);
        assert_eq!(message, expected, "source: {}", source);
    }
}

#[test]
fn runtime_error_stops_execution() {
    let (message, lines) = runtime_error("print 1;\nprint nil + 1;\nprint 2;");

    assert_eq!(message, "Operands must be two numbers or two strings.\n[line 2]");
    assert_eq!(lines, vec!["1"]);
}

#[test]
fn static_errors_prevent_execution_and_set_exit_code() {
    let (outcome, lines) = run("print 1;\nvar = 2;");

    assert!(lines.is_empty());
    assert_eq!(outcome.exit_code(), 65);
}

#[test]
fn exit_codes() {
    assert_eq!(run("print 1;").0.exit_code(), 0);
    assert_eq!(run("print nil + 1;").0.exit_code(), 70);
    assert_eq!(run("return;").0.exit_code(), 65);
    assert_eq!(run("@").0.exit_code(), 65);
}

#[test]
fn globals_persist_across_runs() {
    let (mut session, out) = session();

    assert!(session.run("var count = 1;").is_success());
    assert!(session.run("fun bump() { count = count + 1; }").is_success());

    // A failing input leaves earlier definitions usable.
    assert!(matches!(
        session.run("bump(); print nil + 1;"),
        Outcome::RuntimeError(_)
    ));
    assert!(matches!(
        session.run("print ;"),
        Outcome::StaticErrors(_)
    ));

    assert!(session.run("bump(); print count;").is_success());
    assert_eq!(out.lines(), vec!["3"]);
}

#[test]
fn closures_from_earlier_runs_still_resolve() {
    let (mut session, out) = session();

    assert!(session
        .run("fun make() { var n = 0; fun next() { n = n + 1; return n; } return next; }")
        .is_success());
    assert!(session.run("var counter = make();").is_success());
    assert!(session.run("counter(); print counter();").is_success());

    assert_eq!(out.lines(), vec!["2"]);
}

#[test]
fn evaluate_returns_the_expression_value() {
    let (mut session, _) = session();

    let value = session.evaluate("\"a\" + \"b\"").expect("should evaluate");
    assert_eq!(value.to_string(), "ab");

    let value = session.evaluate("(1 + 2) * 4").expect("should evaluate");
    assert_eq!(value.to_string(), "12");

    let err = session.evaluate("-nil").expect_err("should fail");
    assert!(!err.is_static());
    assert_eq!(err.to_string(), "Operand must be a number.\n[line 1]");

    let err = session.evaluate("1 +").expect_err("should fail");
    assert!(err.is_static());
}

#[test]
fn running_the_same_program_twice_prints_the_same_output() {
    let source = r#"
        class Node { init(v, next) { this.v = v; this.next = next; } }
        var list = Node(1, Node(2, Node(3, nil)));
        var sum = 0;
        while (list != nil) { sum = sum + list.v; list = list.next; }
        print sum;
    "#;

    assert_eq!(output_of(source), output_of(source));
    assert_eq!(output_of(source), vec!["6"]);
}

struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn failed_print_is_a_runtime_error() {
    let mut session = Session::with_output(Box::new(ClosedPipe));

    match session.run("var a = 1;\nprint a;\na = 2;") {
        Outcome::RuntimeError(e) => {
            assert_eq!(e.line, 2);
            assert!(e.message.starts_with("Failed to write output:"));
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}
