use std::fmt::Display;

use thiserror::Error;

use crate::token::{Token, TokenKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorMsg {
    // Lex errors
    UnexpectedChar,
    UnterminatedString,
    UnterminatedComment,
    UnrepresentableNumber,
    // Parse errors
    ExpectedExpr,
    ExpectedVarName,
    ExpectedParamName,
    ExpectedFunctionName,
    ExpectedParenAfterGroup,
    ExpectedParenAfterIf,
    ExpectedParenAfterIfCondition,
    ExpectedParenAfterWhile,
    ExpectedParenAfterCondition,
    ExpectedParenAfterFor,
    ExpectedParenAfterForClauses,
    ExpectedParenAfterFunctionName,
    ExpectedParenAfterParams,
    ExpectedParenAfterArgs,
    ExpectedBraceBeforeBody,
    ExpectedBraceAfterBlock,
    ExpectedSemicolonAfterValue,
    ExpectedSemicolonAfterExpr,
    ExpectedSemicolonAfterVar,
    ExpectedSemicolonAfterCondition,
    ExpectedSemicolonAfterReturn,
    InvalidAssignment,
    TooManyParams,
    TooManyArgs,
    TopLevelReturn,
}

impl Display for ErrorMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::UnexpectedChar => "Unexpected character.",
            Self::UnterminatedString => "Unterminated string.",
            Self::UnterminatedComment => "Unterminated block comment.",
            Self::UnrepresentableNumber => {
                "Number literal cannot be represented by the decimal type"
            }
            Self::ExpectedExpr => "Expect expression.",
            Self::ExpectedVarName => "Expect variable name.",
            Self::ExpectedParamName => "Expect parameter name.",
            Self::ExpectedFunctionName => "Expect function name.",
            Self::ExpectedParenAfterGroup => "Expect ')' after expression.",
            Self::ExpectedParenAfterIf => "Expect '(' after 'if'.",
            Self::ExpectedParenAfterIfCondition => "Expect ')' after if condition.",
            Self::ExpectedParenAfterWhile => "Expect '(' after 'while'.",
            Self::ExpectedParenAfterCondition => "Expect ')' after condition.",
            Self::ExpectedParenAfterFor => "Expect '(' after 'for'.",
            Self::ExpectedParenAfterForClauses => "Expect ')' after for clauses.",
            Self::ExpectedParenAfterFunctionName => "Expect '(' after function name.",
            Self::ExpectedParenAfterParams => "Expect ')' after parameters.",
            Self::ExpectedParenAfterArgs => "Expect ')' after arguments.",
            Self::ExpectedBraceBeforeBody => "Expect '{' before function body.",
            Self::ExpectedBraceAfterBlock => "Expect '}' after block.",
            Self::ExpectedSemicolonAfterValue => "Expect ';' after value.",
            Self::ExpectedSemicolonAfterExpr => "Expect ';' after expression.",
            Self::ExpectedSemicolonAfterVar => "Expect ';' after variable declaration.",
            Self::ExpectedSemicolonAfterCondition => "Expect ';' after loop condition.",
            Self::ExpectedSemicolonAfterReturn => "Expect ';' after return value.",
            Self::InvalidAssignment => "Invalid assignment target.",
            Self::TooManyParams => "Can't have more than 255 parameters.",
            Self::TooManyArgs => "Can't have more than 255 arguments.",
            Self::TopLevelReturn => "Can't return from top-level code.",
        })
    }
}

/// Marker for a syntax error that has already been reported.
/// It unwinds the parser up to the enclosing declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseError;

/// A single rendered diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("[line {line}] Error{context}: {message}")]
    Static {
        line: usize,
        context: String,
        message: String,
    },
    #[error("{message}\n[line {line}]")]
    Runtime { line: usize, message: String },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Self::Static { line, .. } | Self::Runtime { line, .. } => *line,
        }
    }
}

/// Sink for every error the pipeline produces. The lexer and parser
/// report static errors as they find them, and the interpreter reports
/// the runtime error that stopped it.
pub trait Reporter {
    fn report(&mut self, line: usize, message: &str, context: &str);

    fn report_runtime(&mut self, line: usize, message: &str);

    /// True once any lex or parse error was reported.
    fn had_error(&self) -> bool;

    fn had_runtime_error(&self) -> bool;

    /// Clear both error flags, e.g. between REPL lines.
    fn reset(&mut self);

    fn report_at(&mut self, token: &Token, message: &str) {
        let context = if token.kind == TokenKind::EOF {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        self.report(token.line, message, &context);
    }
}

/// Reporter that keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Rendered diagnostics, one string each.
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics.iter().map(ToString::to_string).collect()
    }
}

impl Reporter for Diagnostics {
    fn report(&mut self, line: usize, message: &str, context: &str) {
        self.diagnostics.push(Diagnostic::Static {
            line,
            context: context.to_string(),
            message: message.to_string(),
        });
        self.had_error = true;
    }

    fn report_runtime(&mut self, line: usize, message: &str) {
        self.diagnostics.push(Diagnostic::Runtime {
            line,
            message: message.to_string(),
        });
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
