//! Debug rendering of the syntax tree as fully parenthesised prefix
//! expressions, e.g. `(+ 1 (* 2 3))`.

use std::fmt::{Display, Formatter, Result};

use crate::ast::{Expr, Program, Stmt};

fn parenthesize<T: Display>(f: &mut Formatter<'_>, name: &str, parts: &[T]) -> Result {
    write!(f, "({name}")?;
    for part in parts {
        write!(f, " {part}")?;
    }
    f.write_str(")")
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Assignment { name, value } => write!(f, "(assign {name} {value})"),
            Self::Binary { lhs, op, rhs, .. } => write!(f, "({op} {lhs} {rhs})"),
            Self::Call { callee, args, .. } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            Self::Group(expr) => write!(f, "(group {expr})"),
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Logical { lhs, op, rhs, .. } => write!(f, "({op} {lhs} {rhs})"),
            Self::Unary { op, expr, .. } => write!(f, "({op} {expr})"),
            Self::Variable(name) => write!(f, "{name}"),
        }
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::Block(items) => parenthesize(f, "block", items),
            Self::Expr(expr) => write!(f, "(; {expr})"),
            Self::Function(decl) => {
                let params = decl
                    .params
                    .iter()
                    .map(|p| p.lexeme.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let name = format!("fun {} ({params})", decl.name);
                parenthesize(f, &name, &decl.body)
            }
            Self::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => write!(f, "(if {condition} {then_branch} {else_branch})"),
                None => write!(f, "(if {condition} {then_branch})"),
            },
            Self::Print { expr, .. } => write!(f, "(print {expr})"),
            Self::Return { value, .. } => match value {
                Some(value) => write!(f, "(return {value})"),
                None => f.write_str("(return)"),
            },
            Self::Var { name, init } => match init {
                Some(init) => write!(f, "(var {name} {init})"),
                None => write!(f, "(var {name})"),
            },
            Self::While { condition, body } => write!(f, "(while {condition} {body})"),
        }
    }
}

/// One statement per line. Declarations that failed to parse
/// show up as `<error>`.
impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        for (i, stmt) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            match stmt {
                Some(stmt) => write!(f, "{stmt}")?,
                None => f.write_str("<error>")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::{BinOp, Literal, UnaryOp},
        token::{TextRange, Token, TokenKind},
    };
    use rust_decimal::Decimal;

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme.to_string(), None, 1, TextRange::default())
    }

    fn number(n: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Number(Decimal::from(n))))
    }

    #[test]
    fn expr() {
        let expr = Expr::Binary {
            lhs: Box::new(Expr::Unary {
                op: UnaryOp::Minus,
                token: token(TokenKind::MINUS, "-"),
                expr: number(123),
            }),
            op: BinOp::Star,
            token: token(TokenKind::STAR, "*"),
            rhs: Box::new(Expr::Group(Box::new(Expr::Literal(Literal::Number(
                Decimal::new(4567, 2),
            ))))),
        };
        assert_eq!(expr.to_string(), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn literals() {
        assert_eq!(Expr::Literal(Literal::Nil).to_string(), "nil");
        assert_eq!(Expr::Literal(Literal::Boolean(false)).to_string(), "false");
        assert_eq!(
            Expr::Literal(Literal::Str("hi".to_string())).to_string(),
            "hi"
        );
        assert_eq!(
            Expr::Literal(Literal::Number(Decimal::new(30, 1))).to_string(),
            "3"
        );
        assert_eq!(
            Expr::Literal(Literal::Number(Decimal::new(150, 2))).to_string(),
            "1.50"
        );
    }

    #[test]
    fn program() {
        let program = Program {
            statements: vec![
                Some(Stmt::Expr(*number(1))),
                None,
                Some(Stmt::Var {
                    name: token(TokenKind::IDENT, "a"),
                    init: None,
                }),
            ],
        };
        assert_eq!(program.to_string(), "(; 1)\n<error>\n(var a)");
    }
}
