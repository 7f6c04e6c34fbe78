use std::{fmt::Display, rc::Rc};

use rust_decimal::Decimal;

use crate::token::{Token, TokenKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Bang,
    Minus,
}

impl UnaryOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::BANG => Self::Bang,
            TokenKind::MINUS => Self::Minus,
            _ => return None,
        };
        Some(op)
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Bang => "!",
            Self::Minus => "-",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Slash,
    Star,
    Plus,
    Minus,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    BangEqual,
    EqualEqual,
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Slash => "/",
            Self::Star => "*",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::BangEqual => "!=",
            Self::EqualEqual => "==",
        })
    }
}

impl BinOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::SLASH => Self::Slash,
            TokenKind::STAR => Self::Star,
            TokenKind::PLUS => Self::Plus,
            TokenKind::MINUS => Self::Minus,
            TokenKind::GREATER => Self::Greater,
            TokenKind::GREATER_EQUAL => Self::GreaterEqual,
            TokenKind::LESS => Self::Less,
            TokenKind::LESS_EQUAL => Self::LessEqual,
            TokenKind::BANG_EQUAL => Self::BangEqual,
            TokenKind::EQUAL_EQUAL => Self::EqualEqual,
            _ => return None,
        };
        Some(op)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn from_token(t: TokenKind) -> Option<Self> {
        let op = match t {
            TokenKind::AND => Self::And,
            TokenKind::OR => Self::Or,
            _ => return None,
        };
        Some(op)
    }
}

impl Display for LogicalOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::And => "and",
            Self::Or => "or",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Number(Decimal),
    Str(String),
    Boolean(bool),
    Nil,
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Number(n) => f.write_str(&number_text(n)),
            Self::Str(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

/// Render a number with its scale kept, so `1.50` stays `1.50`.
/// Only an integral `.0` is trimmed, and zero never carries a sign.
pub fn number_text(n: &Decimal) -> String {
    let n = if n.is_zero() { n.abs() } else { *n };
    let text = n.to_string();
    match text.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => text,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Assignment {
        name: Token,
        value: Box<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinOp,
        token: Token,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        // Closing parenthesis, used to locate call errors
        paren: Token,
        args: Vec<Expr>,
    },
    Group(Box<Expr>),
    Literal(Literal),
    Logical {
        lhs: Box<Expr>,
        op: LogicalOp,
        token: Token,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        token: Token,
        expr: Box<Expr>,
    },
    Variable(Token),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Expr(Expr),
    /// Shared so that a function value can outlive the program it was
    /// declared in.
    Function(Rc<FunctionDecl>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print {
        keyword: Token,
        expr: Expr,
    },
    Return {
        keyword: Token,
        value: Option<Expr>,
    },
    Var {
        name: Token,
        init: Option<Expr>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
}

/// The result of parsing a whole source text. A declaration that failed
/// to parse leaves `None` at its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<Option<Stmt>>,
}

impl Program {
    /// Whether every top level declaration parsed.
    pub fn is_complete(&self) -> bool {
        self.statements.iter().all(Option::is_some)
    }

    /// The parsed statements, skipping the failed positions.
    pub fn iter(&self) -> impl Iterator<Item = &Stmt> {
        self.statements.iter().flatten()
    }

    pub fn into_statements(self) -> Vec<Stmt> {
        self.statements.into_iter().flatten().collect()
    }
}
