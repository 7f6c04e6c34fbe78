use std::{
    cell::RefCell,
    io::{self, Write},
    ops::ControlFlow,
    rc::Rc,
};

use log::{debug, warn};
use lox_syntax::{
    ast::{BinOp, Expr, LogicalOp, Stmt, UnaryOp},
    error::Reporter,
    token::Token,
};
use rust_decimal::Decimal;

use crate::{
    environment::Env,
    error::{make, ErrorMsg, RuntimeError},
    types::{Callable, Func, Value},
};

/// Outcome of executing a statement. `Break` carries the value of a
/// `return` up to the enclosing call, where it is consumed.
pub type Flow = ControlFlow<Value>;

/// Nested calls allowed before `Stack overflow.` is raised.
pub const MAX_CALL_DEPTH: usize = 4096;

// Grow the native stack when less than this remains
const RED_ZONE: usize = 128 * 1024;
const STACK_PER_RECURSION: usize = 1024 * 1024;

pub struct Interpreter {
    globals: Rc<RefCell<Env>>,
    env: Rc<RefCell<Env>>,
    out: Box<dyn Write>,
    depth: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Env::globals())
    }
}

impl Interpreter {
    /// Create an interpreter over `globals` that prints to stdout.
    /// The globals persist across calls to [`Interpreter::interpret`].
    pub fn new(globals: Rc<RefCell<Env>>) -> Self {
        Self::with_output(globals, io::stdout())
    }

    pub fn with_output(globals: Rc<RefCell<Env>>, out: impl Write + 'static) -> Self {
        Self {
            env: globals.clone(),
            globals,
            out: Box::new(out),
            depth: 0,
            max_depth: MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn globals(&self) -> &Rc<RefCell<Env>> {
        &self.globals
    }

    /// Execute `items`, reporting the runtime error that stops
    /// execution, if any.
    pub fn interpret(&mut self, items: &[Stmt], reporter: &mut dyn Reporter) {
        if let Err(e) = self.interpret_all(items) {
            debug!("Execution stopped: {e:?}");
            reporter.report_runtime(e.token.line, &e.msg.to_string());
        }
    }

    pub fn interpret_all(&mut self, items: &[Stmt]) -> Result<(), RuntimeError> {
        if let ControlFlow::Break(value) = self.interpret_stmts(items)? {
            // The parser rejects `return` outside of functions
            warn!("Ignoring top-level return of {value}");
        }
        Ok(())
    }

    fn interpret_stmts(&mut self, items: &[Stmt]) -> Result<Flow, RuntimeError> {
        for item in items {
            let flow = self.interpret_stmt(item)?;
            if flow.is_break() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn interpret_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Expr(expr) => {
                self.interpret_expr(expr)?;
            }
            Stmt::Var { name, init } => self.interpret_var_stmt(name, init.as_ref())?,
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => return self.interpret_if_stmt(condition, then_branch, else_branch.as_deref()),
            Stmt::While { condition, body } => return self.interpret_while_stmt(condition, body),
            Stmt::Print { keyword, expr } => self.interpret_print_stmt(keyword, expr)?,
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.interpret_expr(expr)?,
                    None => Value::Nil,
                };
                return Ok(ControlFlow::Break(value));
            }
            Stmt::Block(items) => {
                return self.interpret_block(items, Env::with_parent(self.env.clone()))
            }
            Stmt::Function(decl) => {
                let func = Func {
                    decl: decl.clone(),
                    closure: self.env.clone(),
                };
                self.env
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Func(Rc::new(func)));
            }
        };
        Ok(ControlFlow::Continue(()))
    }

    fn interpret_var_stmt(
        &mut self,
        name: &Token,
        init: Option<&Expr>,
    ) -> Result<(), RuntimeError> {
        let value = match init {
            Some(expr) => self.interpret_expr(expr)?,
            None => Value::Nil,
        };
        self.env.borrow_mut().define(&name.lexeme, value);
        Ok(())
    }

    fn interpret_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> Result<Flow, RuntimeError> {
        if self.interpret_expr(condition)?.is_truthy() {
            self.interpret_stmt(then_branch)
        } else if let Some(item) = else_branch {
            self.interpret_stmt(item)
        } else {
            Ok(ControlFlow::Continue(()))
        }
    }

    fn interpret_while_stmt(
        &mut self,
        condition: &Expr,
        body: &Stmt,
    ) -> Result<Flow, RuntimeError> {
        while self.interpret_expr(condition)?.is_truthy() {
            let flow = self.interpret_stmt(body)?;
            if flow.is_break() {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    fn interpret_print_stmt(&mut self, keyword: &Token, expr: &Expr) -> Result<(), RuntimeError> {
        let value = self.interpret_expr(expr)?;
        writeln!(self.out, "{value}").map_err(|e| make(ErrorMsg::Output(e.to_string()), keyword))
    }

    pub(crate) fn interpret_block(
        &mut self,
        items: &[Stmt],
        env: Rc<RefCell<Env>>,
    ) -> Result<Flow, RuntimeError> {
        let previous = std::mem::replace(&mut self.env, env);
        let res = self.interpret_stmts(items);
        self.env = previous;
        res
    }

    fn interpret_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Assignment { name, value } => self.interpret_assignment(name, value),
            Expr::Literal(lit) => Ok(Value::from(lit.clone())),
            Expr::Variable(name) => self.env.borrow().get(name),
            Expr::Unary { op, token, expr } => self.interpret_unary(*op, token, expr),
            Expr::Binary { lhs, op, token, rhs } => self.interpret_binary(lhs, *op, token, rhs),
            Expr::Logical { lhs, op, rhs, .. } => self.interpret_logical(lhs, *op, rhs),
            Expr::Group(e) => self.interpret_expr(e),
            Expr::Call {
                callee,
                paren,
                args,
            } => self.interpret_func_call(callee, paren, args),
        }
    }

    fn interpret_assignment(&mut self, name: &Token, expr: &Expr) -> Result<Value, RuntimeError> {
        let value = self.interpret_expr(expr)?;
        self.env.borrow_mut().assign(name, value.clone())?;
        Ok(value)
    }

    fn interpret_unary(
        &mut self,
        op: UnaryOp,
        token: &Token,
        expr: &Expr,
    ) -> Result<Value, RuntimeError> {
        let value = self.interpret_expr(expr)?;
        match op {
            UnaryOp::Minus => {
                if let Value::Number(n) = value {
                    Ok(Value::Number(-n))
                } else {
                    Err(make(ErrorMsg::ExpectedNumber, token))
                }
            }
            UnaryOp::Bang => Ok(Value::Boolean(!value.is_truthy())),
        }
    }

    fn interpret_logical(
        &mut self,
        lhs: &Expr,
        op: LogicalOp,
        rhs: &Expr,
    ) -> Result<Value, RuntimeError> {
        let left = self.interpret_expr(lhs)?;
        match (op, left.is_truthy()) {
            (LogicalOp::Or, true) | (LogicalOp::And, false) => Ok(left),
            _ => self.interpret_expr(rhs),
        }
    }

    fn interpret_binary(
        &mut self,
        lhs: &Expr,
        op: BinOp,
        token: &Token,
        rhs: &Expr,
    ) -> Result<Value, RuntimeError> {
        let left = self.interpret_expr(lhs)?;
        let right = self.interpret_expr(rhs)?;

        match op {
            BinOp::EqualEqual => Ok(Value::Boolean(left == right)),
            BinOp::BangEqual => Ok(Value::Boolean(left != right)),
            BinOp::Plus => match (left, right) {
                (Value::Number(m), Value::Number(n)) => checked(m.checked_add(n), token),
                (Value::Str(m), Value::Str(n)) => Ok(Value::Str(m + &n)),
                _ => Err(make(ErrorMsg::ExpectedNumsOrStrs, token)),
            },
            BinOp::Minus => {
                let (m, n) = numbers(&left, &right, token)?;
                checked(m.checked_sub(n), token)
            }
            BinOp::Star => {
                let (m, n) = numbers(&left, &right, token)?;
                checked(m.checked_mul(n), token)
            }
            BinOp::Slash => {
                let (m, n) = numbers(&left, &right, token)?;
                if n.is_zero() {
                    return Err(make(ErrorMsg::DivisionByZero, token));
                }
                checked(m.checked_div(n), token)
            }
            BinOp::Greater => numbers(&left, &right, token).map(|(m, n)| Value::Boolean(m > n)),
            BinOp::GreaterEqual => {
                numbers(&left, &right, token).map(|(m, n)| Value::Boolean(m >= n))
            }
            BinOp::Less => numbers(&left, &right, token).map(|(m, n)| Value::Boolean(m < n)),
            BinOp::LessEqual => {
                numbers(&left, &right, token).map(|(m, n)| Value::Boolean(m <= n))
            }
        }
    }

    fn interpret_func_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        arg_exprs: &[Expr],
    ) -> Result<Value, RuntimeError> {
        let callee = self.interpret_expr(callee)?;
        let args = arg_exprs
            .iter()
            .map(|arg| self.interpret_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let func: &dyn Callable = match &callee {
            Value::Func(f) => f.as_ref(),
            Value::NativeFunc(f) => f,
            _ => return Err(make(ErrorMsg::InvalidCallExpr, paren)),
        };
        // Ensure the number of arguments matches the function definition
        if func.arity() != args.len() {
            return Err(make(
                ErrorMsg::ArityMismatch {
                    expected: func.arity(),
                    found: args.len(),
                },
                paren,
            ));
        }

        if self.depth >= self.max_depth {
            return Err(make(ErrorMsg::StackOverflow, paren));
        }
        self.depth += 1;
        let res = stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || {
            func.call(self, paren, args)
        });
        self.depth -= 1;
        res
    }

    /// Run the body of `func` in a fresh scope whose parent is the
    /// function's closure, not the caller's scope.
    pub(crate) fn call_func(
        &mut self,
        func: &Func,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug!("Call {func}");
        let env = Env::with_parent(func.closure.clone());
        for (param, value) in func.decl.params.iter().zip(args) {
            env.borrow_mut().define(&param.lexeme, value);
        }

        Ok(match self.interpret_block(&func.decl.body, env)? {
            ControlFlow::Break(value) => value,
            ControlFlow::Continue(()) => Value::Nil,
        })
    }
}

fn numbers(left: &Value, right: &Value, token: &Token) -> Result<(Decimal, Decimal), RuntimeError> {
    match (left, right) {
        (Value::Number(m), Value::Number(n)) => Ok((*m, *n)),
        _ => Err(make(ErrorMsg::ExpectedNumbers, token)),
    }
}

fn checked(result: Option<Decimal>, token: &Token) -> Result<Value, RuntimeError> {
    result
        .map(Value::Number)
        .ok_or_else(|| make(ErrorMsg::NumericOverflow, token))
}
