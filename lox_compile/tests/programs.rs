use lox_compile::{
    environment::Env, interpret::Interpreter, output::Capture, run, run_echoed, Echo,
};
use lox_syntax::error::{Diagnostics, Reporter};
use pretty_assertions::assert_eq;

struct Session {
    interpreter: Interpreter,
    out: Capture,
    diagnostics: Diagnostics,
}

impl Session {
    fn new() -> Self {
        let out = Capture::new();
        Self {
            interpreter: Interpreter::with_output(Env::globals(), out.clone()),
            out,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Run `source` and return what it printed.
    fn run(&mut self, source: &str) -> String {
        run(source, &mut self.interpreter, &mut self.diagnostics);
        self.out.take()
    }
}

fn run_ok(source: &str) -> String {
    let mut session = Session::new();
    let out = session.run(source);
    assert!(
        session.diagnostics.is_empty(),
        "{:?}",
        session.diagnostics.messages()
    );
    out
}

fn run_err(source: &str) -> (String, Vec<String>) {
    let mut session = Session::new();
    let out = session.run(source);
    (out, session.diagnostics.messages())
}

#[test]
fn precedence() {
    assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
    assert_eq!(run_ok("print (1 + 2) * 3;"), "9\n");
    assert_eq!(run_ok("print 2 - 3 - 4;"), "-5\n");
    assert_eq!(run_ok("print -2 * -3 > 5 == true;"), "true\n");
}

#[test]
fn string_concatenation() {
    assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
    let (out, errors) = run_err("print \"before\";\n1 + \"a\";\nprint \"after\";");
    assert_eq!(out, "before\n");
    assert_eq!(
        errors,
        vec!["Operands must be two numbers or two strings.\n[line 2]"]
    );
}

#[test]
fn shadowing() {
    assert_eq!(
        run_ok("var a = 1; { var a = 2; print a; } print a;"),
        "2\n1\n"
    );
}

#[test]
fn assignment_reaches_enclosing_scope() {
    assert_eq!(
        run_ok("var a = 1; { a = 2; { a = a + 1; } } print a; var b; print b;"),
        "3\nnil\n"
    );
}

#[test]
fn counters_keep_their_own_state() {
    let source = "
        fun makeCounter() {
            var i = 0;
            fun inc() { i = i + 1; print i; }
            return inc;
        }
        var c = makeCounter();
        c();
        c();
        var d = makeCounter();
        d();
        c();
    ";
    assert_eq!(run_ok(source), "1\n2\n1\n3\n");
}

#[test]
fn closures_see_later_assignments() {
    let source = "
        var a = \"before\";
        fun show() { print a; }
        a = \"after\";
        show();
    ";
    assert_eq!(run_ok(source), "after\n");
}

#[test]
fn closure_in_loop_keeps_its_binding() {
    let source = "
        var first;
        var second;
        for (var i = 0; i < 2; i = i + 1) {
            var j = i;
            fun get() { return j; }
            if (first == nil) first = get; else second = get;
        }
        print first();
        print second();
    ";
    assert_eq!(run_ok(source), "0\n1\n");
}

#[test]
fn arity_mismatch() {
    let (out, errors) = run_err("fun add(a, b) { return a + b; }\nprint add(1);");
    assert_eq!(out, "");
    assert_eq!(errors, vec!["Expected 2 arguments, but got 1.\n[line 2]"]);
}

#[test]
fn calling_a_non_function() {
    let (_, errors) = run_err("var x = 1;\nx();");
    assert_eq!(
        errors,
        vec!["Cannot call this expression; it is not a function or class.\n[line 2]"]
    );
}

#[test]
fn syntax_errors_prevent_execution() {
    let mut session = Session::new();
    let out = session.run("var = 1;\nprint ;\nprint \"ran\";");
    assert_eq!(out, "");
    assert!(session.diagnostics.had_error());
    assert!(!session.diagnostics.had_runtime_error());
    assert_eq!(
        session.diagnostics.messages(),
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 2] Error at ';': Expect expression.",
        ]
    );
}

#[test]
fn lex_errors_are_reported_with_parse_errors() {
    let (out, errors) = run_err("print 1 @;\nprint \"open");
    assert_eq!(out, "");
    assert_eq!(
        errors,
        vec![
            "[line 1] Error: Unexpected character.",
            "[line 2] Error: Unterminated string.",
            "[line 2] Error at end: Expect expression.",
        ]
    );
}

#[test]
fn scanning_is_deterministic() {
    let source = "var x = (1 + 2;\nprint x;";
    let (_, first) = run_err(source);
    let (_, second) = run_err(source);
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[test]
fn logical_operators_short_circuit() {
    let source = "
        fun boom() { print \"boom\"; return true; }
        print false and boom();
        print true or boom();
        print nil or \"default\";
        print 1 and 2;
    ";
    assert_eq!(run_ok(source), "false\ntrue\ndefault\n2\n");
}

#[test]
fn decimal_arithmetic() {
    assert_eq!(run_ok("print 0.1 + 0.2;"), "0.3\n");
    assert_eq!(run_ok("print 10 / 4;"), "2.5\n");
}

#[test]
fn numbers_keep_their_scale() {
    assert_eq!(
        run_ok("print 1.50; print 1.25 * 4; print 1.10 * 3; print 2.5 * 2; print -0.0;"),
        "1.50\n5.00\n3.30\n5\n0\n"
    );
}

#[test]
fn division_by_zero() {
    let (out, errors) = run_err("print 1;\nprint 1 / 0;");
    assert_eq!(out, "1\n");
    assert_eq!(errors, vec!["Division by zero.\n[line 2]"]);
}

#[test]
fn recursion() {
    let source = "
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(15);
    ";
    assert_eq!(run_ok(source), "610\n");
}

#[test]
fn deep_recursion() {
    let source = "
        fun count(n) {
            if (n == 0) return 0;
            return count(n - 1) + 1;
        }
        print count(3000);
    ";
    assert_eq!(run_ok(source), "3000\n");
}

#[test]
fn unbounded_recursion_is_a_runtime_error() {
    let (out, errors) = run_err("fun f() {\n  f();\n}\nf();\nprint \"unreachable\";");
    assert_eq!(out, "");
    assert_eq!(errors, vec!["Stack overflow.\n[line 2]"]);
}

#[test]
fn control_flow() {
    let source = "
        var total = 0;
        var i = 0;
        while (i < 5) { total = total + i; i = i + 1; }
        print total;
        for (var j = 0; j < 3; j = j + 1) print j;
        if (total > 100) print \"big\"; else print \"small\";
    ";
    assert_eq!(run_ok(source), "10\n0\n1\n2\nsmall\n");
}

#[test]
fn return_unwinds_nested_statements() {
    let source = "
        fun find(limit) {
            for (var i = 0; ; i = i + 1) {
                while (true) {
                    if (i == limit) { return i * 10; }
                    break_out();
                }
            }
        }
        fun break_out() {}
        print find(0);
    ";
    assert_eq!(run_ok(source), "0\n");
}

#[test]
fn functions_print_their_name() {
    assert_eq!(
        run_ok("fun greet() {} print greet; print clock;"),
        "<fn greet>\n<native fn clock>\n"
    );
}

#[test]
fn clock_is_a_number() {
    assert_eq!(run_ok("print clock() > 0;"), "true\n");
}

#[test]
fn top_level_return_is_rejected() {
    let (out, errors) = run_err("print 1;\nreturn 2;");
    assert_eq!(out, "");
    assert_eq!(
        errors,
        vec!["[line 2] Error at 'return': Can't return from top-level code."]
    );
}

#[test]
fn globals_persist_across_runs() {
    let mut session = Session::new();
    assert_eq!(session.run("var a = 1; fun inc() { a = a + 1; }"), "");
    assert_eq!(session.run("inc(); inc();"), "");
    assert_eq!(session.run("print a;"), "3\n");
    assert!(session.diagnostics.is_empty());
}

#[test]
fn session_recovers_after_errors() {
    let mut session = Session::new();
    assert_eq!(session.run("print undefined;"), "");
    assert!(session.diagnostics.had_runtime_error());
    session.diagnostics.reset();
    assert_eq!(session.run("print (;"), "");
    assert!(session.diagnostics.had_error());
    session.diagnostics.reset();
    assert_eq!(session.run("print \"ok\";"), "ok\n");
    assert_eq!(
        session.diagnostics.messages(),
        vec![
            "Undefined variable 'undefined'.\n[line 1]",
            "[line 1] Error at ';': Expect expression.",
        ]
    );
}

#[test]
fn echo_tokens_and_tree() {
    let mut session = Session::new();
    let mut shown = Vec::new();
    let echo = Echo {
        tokens: true,
        tree: true,
    };
    run_echoed(
        "print 1;",
        echo,
        &mut shown,
        &mut session.interpreter,
        &mut session.diagnostics,
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(shown).unwrap(),
        "PRINT print\nNUMBER 1\nSEMICOLON ;\nEOF \n(print 1)\n"
    );
    assert_eq!(session.out.take(), "1\n");
}

#[test]
fn echo_skips_tree_with_syntax_errors() {
    let mut session = Session::new();
    let mut shown = Vec::new();
    let echo = Echo {
        tokens: false,
        tree: true,
    };
    run_echoed(
        "print 1 +;",
        echo,
        &mut shown,
        &mut session.interpreter,
        &mut session.diagnostics,
    )
    .unwrap();
    assert_eq!(shown, b"");
    assert_eq!(
        session.diagnostics.messages(),
        vec!["[line 1] Error at ';': Expect expression."]
    );
    session.diagnostics.reset();

    run_echoed(
        "print 1 + 2;",
        echo,
        &mut shown,
        &mut session.interpreter,
        &mut session.diagnostics,
    )
    .unwrap();
    assert_eq!(String::from_utf8(shown).unwrap(), "(print (+ 1 2))\n");
    assert_eq!(session.out.take(), "3\n");
}
