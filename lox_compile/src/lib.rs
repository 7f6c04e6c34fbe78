pub mod environment;
pub mod error;
pub mod interpret;
pub mod output;
pub mod stdlib;
pub mod types;

use std::io::{self, Write};

use interpret::Interpreter;
use log::trace;
use lox_syntax::{ast::Program, error::Reporter};

/// Scan, parse and execute `source` on `interpreter`. Every error is
/// sent to `reporter`; a program with static errors is not executed.
pub fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut dyn Reporter) {
    trace!("Lexing {source}");
    let tokens = lox_syntax::scan(source, reporter);
    trace!("Parsing {tokens:#?}");
    let program = lox_syntax::parse(&tokens, reporter);
    execute(program, interpreter, reporter);
}

pub fn execute(program: Program, interpreter: &mut Interpreter, reporter: &mut dyn Reporter) {
    if reporter.had_error() {
        trace!("Skipping execution, static errors were reported");
        return;
    }
    trace!("Interpreting {program:#?}");
    interpreter.interpret(&program.into_statements(), reporter);
}

/// Intermediate stages the REPL writes out before running a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Echo {
    pub tokens: bool,
    pub tree: bool,
}

/// Like [`run`], but first writes the stages selected by `echo` to
/// `out`. The tree is only shown for lines that parsed cleanly.
pub fn run_echoed(
    source: &str,
    echo: Echo,
    out: &mut dyn Write,
    interpreter: &mut Interpreter,
    reporter: &mut dyn Reporter,
) -> io::Result<()> {
    let tokens = lox_syntax::scan(source, reporter);
    if echo.tokens {
        for token in &tokens {
            writeln!(out, "{:?} {token}", token.kind)?;
        }
    }
    let program = lox_syntax::parse(&tokens, reporter);
    if echo.tree && !reporter.had_error() {
        writeln!(out, "{program}")?;
    }
    execute(program, interpreter, reporter);
    Ok(())
}
