use lox_compile::{environment::Env, interpret::Interpreter, run, run_echoed, Echo};
use lox_syntax::error::{Diagnostic, Reporter};
use std::{
    env, fs,
    io::{self, Write},
    process::ExitCode,
};

/// Prints every diagnostic to stderr as soon as it is reported.
#[derive(Default)]
struct ConsoleReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, line: usize, message: &str, context: &str) {
        let diagnostic = Diagnostic::Static {
            line,
            context: context.to_string(),
            message: message.to_string(),
        };
        eprintln!("{diagnostic}");
        self.had_error = true;
    }

    fn report_runtime(&mut self, line: usize, message: &str) {
        let diagnostic = Diagnostic::Runtime {
            line,
            message: message.to_string(),
        };
        eprintln!("{diagnostic}");
        self.had_runtime_error = true;
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

fn main() -> ExitCode {
    pretty_env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [] => match run_repl() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{e}");
                ExitCode::from(74)
            }
        },
        [path] => run_file(path),
        _ => {
            eprintln!("Usage: lox [script]");
            ExitCode::from(64)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Could not read {path}: {e}");
            return ExitCode::from(66);
        }
    };
    let mut reporter = ConsoleReporter::default();
    let mut interpreter = Interpreter::new(Env::globals());
    run(&source, &mut interpreter, &mut reporter);
    if reporter.had_error() {
        ExitCode::from(65)
    } else if reporter.had_runtime_error() {
        ExitCode::from(70)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_repl() -> io::Result<()> {
    let (stdin, mut stdout) = (io::stdin(), io::stdout());
    let mut reporter = ConsoleReporter::default();
    let mut interpreter = Interpreter::new(Env::globals());
    let mut echo = Echo::default();
    loop {
        let mut line = String::default();
        print!(">>> ");
        stdout.flush()?;
        // If zero bytes are read, then exit (usually triggered by Ctrl-D)
        if stdin.read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        match line.trim() {
            "#showTokens" => {
                echo.tokens = !echo.tokens;
                println!("showTokens: {}", echo.tokens);
            }
            "#showTree" => {
                echo.tree = !echo.tree;
                println!("showTree: {}", echo.tree);
            }
            _ => run_echoed(&line, echo, &mut stdout, &mut interpreter, &mut reporter)?,
        }
        reporter.reset();
    }
}
