use std::fmt::Display;

use lox_syntax::token::Token;
use thiserror::Error;

/// Raised while executing a program. It carries the token
/// that caused it so the error can be attributed to a line.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{msg}\n[line {}]", .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub msg: ErrorMsg,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorMsg {
    // Type errors
    ExpectedNumber,
    ExpectedNumbers,
    ExpectedNumsOrStrs,
    // Arithmetic errors
    DivisionByZero,
    NumericOverflow,
    // Call errors
    InvalidCallExpr,
    ArityMismatch { expected: usize, found: usize },
    StackOverflow,
    // Memory errors
    UndefinedVar(String),
    // Host errors
    ClockBeforeEpoch,
    Output(String),
}

impl Display for ErrorMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpectedNumber => f.write_str("Operand must be a number."),
            Self::ExpectedNumbers => f.write_str("Operands must be numbers."),
            Self::ExpectedNumsOrStrs => f.write_str("Operands must be two numbers or two strings."),
            Self::DivisionByZero => f.write_str("Division by zero."),
            Self::NumericOverflow => f.write_str("Numeric overflow."),
            Self::InvalidCallExpr => {
                f.write_str("Cannot call this expression; it is not a function or class.")
            }
            Self::ArityMismatch { expected, found } => {
                write!(f, "Expected {expected} arguments, but got {found}.")
            }
            Self::StackOverflow => f.write_str("Stack overflow."),
            Self::UndefinedVar(name) => write!(f, "Undefined variable '{name}'."),
            Self::ClockBeforeEpoch => f.write_str("System clock is set before the Unix epoch."),
            Self::Output(e) => write!(f, "Failed to write output: {e}"),
        }
    }
}

pub fn make(msg: ErrorMsg, token: &Token) -> RuntimeError {
    RuntimeError {
        token: token.clone(),
        msg,
    }
}
