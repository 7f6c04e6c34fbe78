use std::{
    cell::RefCell,
    fmt::{Debug, Display},
    rc::Rc,
};

use lox_syntax::{
    ast::{number_text, FunctionDecl, Literal},
    token::Token,
};
use rust_decimal::Decimal;

use crate::{
    environment::Env,
    error::{make, ErrorMsg, RuntimeError},
    interpret::Interpreter,
};

#[derive(Clone, Debug)]
pub enum Value {
    Boolean(bool),
    Number(Decimal),
    Str(String),
    Func(Rc<Func>),
    NativeFunc(NativeFunc),
    Nil,
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Boolean(b) => *b,
            _ => true,
        }
    }
}

/// Values of different types are never equal. Functions
/// are equal only to themselves.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(m), Self::Boolean(n)) => m == n,
            (Self::Number(m), Self::Number(n)) => m == n,
            (Self::Str(m), Self::Str(n)) => m == n,
            (Self::Func(m), Self::Func(n)) => Rc::ptr_eq(m, n),
            (Self::NativeFunc(m), Self::NativeFunc(n)) => m == n,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&number_text(n)),
            Self::Str(s) => f.write_str(s),
            Self::Func(func) => write!(f, "{func}"),
            Self::NativeFunc(func) => write!(f, "{func}"),
            Self::Nil => f.write_str("nil"),
        }
    }
}

impl From<Literal> for Value {
    fn from(lit: Literal) -> Self {
        match lit {
            Literal::Number(n) => Self::Number(n),
            Literal::Str(s) => Self::Str(s),
            Literal::Boolean(b) => Self::Boolean(b),
            Literal::Nil => Self::Nil,
        }
    }
}

pub trait Callable {
    fn arity(&self) -> usize;
    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

/// A user defined function together with the
/// environment it was declared in.
#[derive(Clone)]
pub struct Func {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Env>>,
}

// The closure may hold this very function, so it is left out
impl Debug for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.decl.name.lexeme)
            .field("arity", &self.arity())
            .finish()
    }
}

impl Display for Func {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<fn {}>", self.decl.name)
    }
}

impl Callable for Func {
    fn arity(&self) -> usize {
        self.decl.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        _: &Token,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        interpreter.call_func(self, args)
    }
}

#[derive(Clone)]
pub struct NativeFunc {
    pub name: &'static str,
    pub arity: usize,
    pub body: fn(&mut Interpreter, Vec<Value>) -> Result<Value, ErrorMsg>,
}

// Natives are installed once per name
impl PartialEq for NativeFunc {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl Debug for NativeFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunc")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Display for NativeFunc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunc {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.body)(interpreter, args).map_err(|msg| make(msg, paren))
    }
}
