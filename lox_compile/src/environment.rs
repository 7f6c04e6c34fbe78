use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::debug;
use lox_syntax::token::Token;

use crate::{
    error::{make, ErrorMsg, RuntimeError},
    stdlib,
    types::Value,
};

/// One scope of bindings. Lookups that miss walk outwards
/// through the parents up to the global scope.
#[derive(Debug, Default)]
pub struct Env {
    values: HashMap<String, Value>,
    parent: Option<Rc<RefCell<Env>>>,
}

impl Env {
    /// The global scope, with the native functions installed.
    pub fn globals() -> Rc<RefCell<Self>> {
        let mut env = Self::default();
        stdlib::init(&mut env);
        Rc::new(RefCell::new(env))
    }

    pub fn with_parent(parent: Rc<RefCell<Env>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            parent: Some(parent),
            ..Default::default()
        }))
    }

    pub fn parent(&self) -> Option<&Rc<RefCell<Env>>> {
        self.parent.as_ref()
    }

    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Define {name} -> {value:?}");
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        debug!("Get {name}");
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(parent) = &self.parent {
            debug!("Get {name} from parent");
            return parent.borrow().get(name);
        }
        Err(make(ErrorMsg::UndefinedVar(name.lexeme.clone()), name))
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        debug!("Assign {name} -> {value:?}");
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }
        if let Some(parent) = &self.parent {
            debug!("Assign {name} in parent");
            return parent.borrow_mut().assign(name, value);
        }
        Err(make(ErrorMsg::UndefinedVar(name.lexeme.clone()), name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lox_syntax::token::{TextRange, TokenKind};
    use rust_decimal::Decimal;

    fn ident(name: &str) -> Token {
        Token::new(
            TokenKind::IDENT,
            name.to_string(),
            None,
            4,
            TextRange::default(),
        )
    }

    fn num(n: i64) -> Value {
        Value::Number(Decimal::from(n))
    }

    #[test]
    fn globals_have_clock() {
        let env = Env::globals();
        assert!(matches!(
            env.borrow().get(&ident("clock")),
            Ok(Value::NativeFunc(_))
        ));
    }

    #[test]
    fn lookup_walks_parents() {
        let global = Rc::new(RefCell::new(Env::default()));
        global.borrow_mut().define("a", num(1));
        let local = Env::with_parent(global.clone());
        assert_eq!(local.borrow().get(&ident("a")).unwrap(), num(1));
        assert!(local.borrow().parent().is_some());
    }

    #[test]
    fn define_shadows() {
        let global = Rc::new(RefCell::new(Env::default()));
        global.borrow_mut().define("a", num(1));
        let local = Env::with_parent(global.clone());
        local.borrow_mut().define("a", num(2));
        assert_eq!(local.borrow().get(&ident("a")).unwrap(), num(2));
        assert_eq!(global.borrow().get(&ident("a")).unwrap(), num(1));
    }

    #[test]
    fn assign_updates_outer_binding() {
        let global = Rc::new(RefCell::new(Env::default()));
        global.borrow_mut().define("a", num(1));
        let local = Env::with_parent(global.clone());
        local.borrow_mut().assign(&ident("a"), num(3)).unwrap();
        assert_eq!(global.borrow().get(&ident("a")).unwrap(), num(3));
    }

    #[test]
    fn undefined() {
        let env = Env::with_parent(Rc::new(RefCell::new(Env::default())));
        let err = env.borrow().get(&ident("nope")).unwrap_err();
        assert_eq!(err.to_string(), "Undefined variable 'nope'.\n[line 4]");
        let err = env
            .borrow_mut()
            .assign(&ident("nope"), Value::Nil)
            .unwrap_err();
        assert_eq!(err.msg, ErrorMsg::UndefinedVar("nope".to_string()));
    }
}
