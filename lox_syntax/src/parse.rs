use std::{iter::Peekable, rc::Rc, slice::Iter};

use log::trace;

use crate::{
    ast::{BinOp, Expr, FunctionDecl, Literal, LogicalOp, Program, Stmt, UnaryOp},
    error::{ErrorMsg, ParseError, Reporter},
    token::{Token, TokenKind},
};

/// Maximum number of parameters in a declaration or arguments in a call.
const MAX_ARGS: usize = 255;

pub struct Parser<'a> {
    stream: Peekable<Iter<'a, Token>>,
    reporter: &'a mut dyn Reporter,
    // Stands in for the end of the stream if the lexer's EOF is missing
    eof: Token,
    function_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(stream: &'a [Token], reporter: &'a mut dyn Reporter) -> Self {
        let eof = match stream.last() {
            Some(t) if t.kind == TokenKind::EOF => t.clone(),
            Some(t) => Token::eof(t.line, t.range.end),
            None => Token::eof(1, 0),
        };
        Self {
            stream: stream.iter().peekable(),
            reporter,
            eof,
            function_depth: 0,
        }
    }

    /// Parse every declaration up to the end of the stream. Syntax errors
    /// are reported as they are found and leave `None` in the program.
    pub fn parse_all(mut self) -> Program {
        let mut statements = Vec::default();
        while !self.at_end() {
            statements.push(self.parse_declaration());
        }
        trace!("Parsed {} statements", statements.len());
        Program { statements }
    }

    fn parse_declaration(&mut self) -> Option<Stmt> {
        let res = match self.advance_if(|t| matches!(t.kind, TokenKind::FUN | TokenKind::VAR)) {
            Some(t) if t.kind == TokenKind::FUN => self
                .parse_function()
                .map(|decl| Stmt::Function(Rc::new(decl))),
            Some(_) => self.parse_var_decl(),
            None => self.parse_stmt(),
        };
        match res {
            Ok(stmt) => Some(stmt),
            Err(ParseError) => {
                self.sync();
                None
            }
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, ParseError> {
        let name = self
            .advance_or_err(TokenKind::IDENT, ErrorMsg::ExpectedVarName)?
            .clone();
        let init = if self.advance_if(|t| t.kind == TokenKind::EQUAL).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        self.advance_or_err(TokenKind::SEMICOLON, ErrorMsg::ExpectedSemicolonAfterVar)?;

        Ok(Stmt::Var { name, init })
    }

    fn parse_function(&mut self) -> Result<FunctionDecl, ParseError> {
        let name = self
            .advance_or_err(TokenKind::IDENT, ErrorMsg::ExpectedFunctionName)?
            .clone();
        self.advance_or_err(TokenKind::LPAREN, ErrorMsg::ExpectedParenAfterFunctionName)?;
        let mut params = vec![];
        if !self.check(TokenKind::RPAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    // Only reported, parsing carries on
                    self.error_at_peek(ErrorMsg::TooManyParams);
                }
                params.push(
                    self.advance_or_err(TokenKind::IDENT, ErrorMsg::ExpectedParamName)?
                        .clone(),
                );
                if self.advance_if(|t| t.kind == TokenKind::COMMA).is_none() {
                    break;
                }
            }
        }
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::ExpectedParenAfterParams)?;
        self.advance_or_err(TokenKind::LBRACE, ErrorMsg::ExpectedBraceBeforeBody)?;

        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;

        Ok(FunctionDecl {
            name,
            params,
            body: body?,
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        let Some(t) = self.advance_if(|t| {
            matches!(
                t.kind,
                TokenKind::FOR
                    | TokenKind::IF
                    | TokenKind::PRINT
                    | TokenKind::RETURN
                    | TokenKind::WHILE
                    | TokenKind::LBRACE
            )
        }) else {
            return self.parse_expr_stmt();
        };
        match t.kind {
            TokenKind::FOR => self.parse_for_stmt(),
            TokenKind::IF => self.parse_if_stmt(),
            TokenKind::PRINT => self.parse_print_stmt(t),
            TokenKind::RETURN => self.parse_return_stmt(t),
            TokenKind::WHILE => self.parse_while_stmt(),
            _ => Ok(Stmt::Block(self.parse_block()?)),
        }
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance_or_err(TokenKind::LPAREN, ErrorMsg::ExpectedParenAfterIf)?;
        let condition = self.parse_expr()?;
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::ExpectedParenAfterIfCondition)?;
        let then_branch = Box::new(self.parse_stmt()?);
        let else_branch = if self.advance_if(|t| t.kind == TokenKind::ELSE).is_some() {
            Some(Box::new(self.parse_stmt()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_print_stmt(&mut self, keyword: &Token) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        self.advance_or_err(TokenKind::SEMICOLON, ErrorMsg::ExpectedSemicolonAfterValue)?;
        Ok(Stmt::Print {
            keyword: keyword.clone(),
            expr,
        })
    }

    fn parse_return_stmt(&mut self, keyword: &Token) -> Result<Stmt, ParseError> {
        if self.function_depth == 0 {
            self.error(keyword, ErrorMsg::TopLevelReturn);
        }
        let value = if self.check(TokenKind::SEMICOLON) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.advance_or_err(TokenKind::SEMICOLON, ErrorMsg::ExpectedSemicolonAfterReturn)?;

        Ok(Stmt::Return {
            keyword: keyword.clone(),
            value,
        })
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance_or_err(TokenKind::LPAREN, ErrorMsg::ExpectedParenAfterWhile)?;
        let condition = self.parse_expr()?;
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::ExpectedParenAfterCondition)?;

        Ok(Stmt::While {
            condition,
            body: Box::new(self.parse_stmt()?),
        })
    }

    /// `for` has no node of its own, it is rewritten into a `while`
    /// loop wrapped in a block that scopes the initialiser.
    fn parse_for_stmt(&mut self) -> Result<Stmt, ParseError> {
        self.advance_or_err(TokenKind::LPAREN, ErrorMsg::ExpectedParenAfterFor)?;
        let init = match self
            .advance_if(|t| matches!(t.kind, TokenKind::SEMICOLON | TokenKind::VAR))
        {
            Some(t) if t.kind == TokenKind::SEMICOLON => None,
            Some(_) => Some(self.parse_var_decl()?),
            None => Some(self.parse_expr_stmt()?),
        };

        let condition = if self.check(TokenKind::SEMICOLON) {
            Expr::Literal(Literal::Boolean(true))
        } else {
            self.parse_expr()?
        };
        self.advance_or_err(TokenKind::SEMICOLON, ErrorMsg::ExpectedSemicolonAfterCondition)?;

        let increment = if self.check(TokenKind::RPAREN) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::ExpectedParenAfterForClauses)?;

        let mut body = self.parse_stmt()?;
        // If the increment is present, create
        // a block and place it at the end
        if let Some(m) = increment {
            body = Stmt::Block(vec![body, Stmt::Expr(m)]);
        }
        let mut items = Vec::with_capacity(2);
        items.extend(init);
        items.push(Stmt::While {
            condition,
            body: Box::new(body),
        });

        Ok(Stmt::Block(items))
    }

    fn parse_expr_stmt(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.parse_expr()?;
        self.advance_or_err(TokenKind::SEMICOLON, ErrorMsg::ExpectedSemicolonAfterExpr)?;
        Ok(Stmt::Expr(expr))
    }

    /// Parse the declarations of a block whose opening brace
    /// has already been consumed.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut items = Vec::default();
        while !self.check(TokenKind::RBRACE) && !self.at_end() {
            // Failed declarations were already reported and synchronised
            if let Some(item) = self.parse_declaration() {
                items.push(item);
            }
        }
        self.advance_or_err(TokenKind::RBRACE, ErrorMsg::ExpectedBraceAfterBlock)?;
        Ok(items)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_logical_or()?;
        let Some(eq) = self.advance_if(|t| t.kind == TokenKind::EQUAL) else {
            return Ok(lhs);
        };
        let rhs = self.parse_assignment()?;
        match lhs {
            Expr::Variable(name) => Ok(Expr::Assignment {
                name,
                value: Box::new(rhs),
            }),
            _ => {
                // Reported without unwinding, the tokens
                // consumed so far are still well formed
                self.error(eq, ErrorMsg::InvalidAssignment);
                Ok(rhs)
            }
        }
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_logical_and()?;
        while let Some((op, token)) = self.advance_op(&[TokenKind::OR], LogicalOp::from_token) {
            let rhs = self.parse_logical_and()?;
            lhs = Expr::Logical {
                lhs: Box::new(lhs),
                op,
                token: token.clone(),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_eq()?;
        while let Some((op, token)) = self.advance_op(&[TokenKind::AND], LogicalOp::from_token) {
            let rhs = self.parse_eq()?;
            lhs = Expr::Logical {
                lhs: Box::new(lhs),
                op,
                token: token.clone(),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_eq(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(
            &[TokenKind::EQUAL_EQUAL, TokenKind::BANG_EQUAL],
            Self::parse_cmp,
        )
    }

    fn parse_cmp(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(
            &[
                TokenKind::GREATER,
                TokenKind::GREATER_EQUAL,
                TokenKind::LESS,
                TokenKind::LESS_EQUAL,
            ],
            Self::parse_term,
        )
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(&[TokenKind::PLUS, TokenKind::MINUS], Self::parse_factor)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary(&[TokenKind::SLASH, TokenKind::STAR], Self::parse_unary)
    }

    /// One left-associative precedence level: `operand (op operand)*`.
    fn parse_binary(
        &mut self,
        kinds: &[TokenKind],
        operand: fn(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        let mut lhs = operand(self)?;
        while let Some((op, token)) = self.advance_op(kinds, BinOp::from_token) {
            let rhs = operand(self)?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                token: token.clone(),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let expr = if let Some((op, token)) =
            self.advance_op(&[TokenKind::BANG, TokenKind::MINUS], UnaryOp::from_token)
        {
            Expr::Unary {
                op,
                token: token.clone(),
                expr: Box::new(self.parse_unary()?),
            }
        } else {
            self.parse_func_call()?
        };

        Ok(expr)
    }

    fn parse_func_call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        while self.advance_if(|t| t.kind == TokenKind::LPAREN).is_some() {
            let mut args = vec![];
            if !self.check(TokenKind::RPAREN) {
                loop {
                    if args.len() >= MAX_ARGS {
                        self.error_at_peek(ErrorMsg::TooManyArgs);
                    }
                    args.push(self.parse_expr()?);
                    if self.advance_if(|t| t.kind == TokenKind::COMMA).is_none() {
                        break;
                    }
                }
            }
            let paren = self
                .advance_or_err(TokenKind::RPAREN, ErrorMsg::ExpectedParenAfterArgs)?
                .clone();
            expr = Expr::Call {
                callee: Box::new(expr),
                paren,
                args,
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(t) = self.advance_if(|t| {
            matches!(
                t.kind,
                TokenKind::TRUE
                    | TokenKind::FALSE
                    | TokenKind::NIL
                    | TokenKind::NUMBER
                    | TokenKind::STRING
                    | TokenKind::IDENT
                    | TokenKind::LPAREN
            )
        }) else {
            return Err(self.error_at_peek(ErrorMsg::ExpectedExpr));
        };
        let lit = match t.kind {
            TokenKind::TRUE => Literal::Boolean(true),
            TokenKind::FALSE => Literal::Boolean(false),
            TokenKind::NIL => Literal::Nil,
            TokenKind::NUMBER | TokenKind::STRING => match &t.literal {
                Some(lit) => lit.clone(),
                None => return Err(self.error(t, ErrorMsg::ExpectedExpr)),
            },
            TokenKind::IDENT => return Ok(Expr::Variable(t.clone())),
            _ => return self.parse_group(),
        };
        Ok(Expr::Literal(lit))
    }

    fn parse_group(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr()?;
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::ExpectedParenAfterGroup)?;
        Ok(Expr::Group(Box::new(expr)))
    }

    fn at_end(&mut self) -> bool {
        self.check(TokenKind::EOF)
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn peek_kind(&mut self) -> TokenKind {
        self.stream.peek().map_or(TokenKind::EOF, |t| t.kind)
    }

    /// The `EOF` token is never consumed.
    fn advance(&mut self) -> Option<&'a Token> {
        self.stream.next_if(|t| t.kind != TokenKind::EOF)
    }

    fn advance_if<F>(&mut self, cond: F) -> Option<&'a Token>
    where
        F: FnOnce(&Token) -> bool,
    {
        self.stream.next_if(|&t| t.kind != TokenKind::EOF && cond(t))
    }

    fn advance_op<O>(
        &mut self,
        kinds: &[TokenKind],
        from_token: fn(TokenKind) -> Option<O>,
    ) -> Option<(O, &'a Token)> {
        let token = self.advance_if(|t| kinds.contains(&t.kind))?;
        from_token(token.kind).map(|op| (op, token))
    }

    fn advance_or_err(&mut self, kind: TokenKind, msg: ErrorMsg) -> Result<&'a Token, ParseError> {
        match self.advance_if(|t| t.kind == kind) {
            Some(t) => Ok(t),
            None => Err(self.error_at_peek(msg)),
        }
    }

    /// Discard tokens until just past a `;` or right before
    /// a token that starts a new statement.
    fn sync(&mut self) {
        while let Some(t) = self.advance() {
            if t.kind == TokenKind::SEMICOLON || self.peek_kind().starts_statement() {
                return;
            }
        }
    }

    fn error(&mut self, token: &Token, msg: ErrorMsg) -> ParseError {
        self.reporter.report_at(token, &msg.to_string());
        ParseError
    }

    fn error_at_peek(&mut self, msg: ErrorMsg) -> ParseError {
        let token = match self.stream.peek() {
            Some(&t) => t.clone(),
            None => self.eof.clone(),
        };
        self.error(&token, msg)
    }
}
