use std::fmt::Display;

use crate::ast::Literal;

/// Byte span of a lexeme in the source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

/// The enum variants are in SCREAMING_SNAKE_CASE as they technically
/// represent constants, but Rust does not allow const enum variants.
#[allow(nonstandard_style)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenKind {
    // Symbols
    LPAREN,
    RPAREN,
    LBRACE,
    RBRACE,
    COMMA,
    DOT,
    SEMICOLON,
    // Arithmetic
    BANG,
    MINUS,
    PLUS,
    SLASH,
    STAR,
    // Comparisons
    BANG_EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,
    // Literals
    IDENT,
    STRING,
    NUMBER,
    // Keywords
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,
    // Miscellaneous tokens
    EQUAL,
    EOF,
}

impl TokenKind {
    /// Single character tokens that never need a lookahead.
    pub fn from_char(c: char) -> Option<Self> {
        let token = match c {
            '(' => Self::LPAREN,
            ')' => Self::RPAREN,
            '{' => Self::LBRACE,
            '}' => Self::RBRACE,
            ',' => Self::COMMA,
            '.' => Self::DOT,
            '-' => Self::MINUS,
            '+' => Self::PLUS,
            ';' => Self::SEMICOLON,
            '*' => Self::STAR,
            _ => return None,
        };
        Some(token)
    }

    pub fn from_keyword(kw: &str) -> Option<Self> {
        let token = match kw {
            "and" => Self::AND,
            "class" => Self::CLASS,
            "else" => Self::ELSE,
            "false" => Self::FALSE,
            "for" => Self::FOR,
            "fun" => Self::FUN,
            "if" => Self::IF,
            "nil" => Self::NIL,
            "or" => Self::OR,
            "print" => Self::PRINT,
            "return" => Self::RETURN,
            "super" => Self::SUPER,
            "this" => Self::THIS,
            "true" => Self::TRUE,
            "var" => Self::VAR,
            "while" => Self::WHILE,
            _ => return None,
        };
        Some(token)
    }

    /// Tokens that begin a declaration or statement. The parser
    /// resynchronises on these after a syntax error.
    pub fn starts_statement(self) -> bool {
        matches!(
            self,
            Self::CLASS
                | Self::FUN
                | Self::VAR
                | Self::FOR
                | Self::IF
                | Self::WHILE
                | Self::PRINT
                | Self::RETURN
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
    pub range: TextRange,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lexeme)
    }
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: String,
        literal: Option<Literal>,
        line: usize,
        range: TextRange,
    ) -> Self {
        Self {
            kind,
            lexeme,
            literal,
            line,
            range,
        }
    }

    pub fn eof(line: usize, offset: usize) -> Self {
        Self::new(
            TokenKind::EOF,
            String::default(),
            None,
            line,
            TextRange {
                start: offset,
                end: offset,
            },
        )
    }
}
