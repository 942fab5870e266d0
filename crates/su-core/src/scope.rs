//! Component I — lexical scope / variable storage (spec §3.5, §4.I).
//!
//! Scopes form a parent chain, one per block (`if`/`while`/`for`/`match` arm
//! body). A lookup walks outward until it finds a binding or runs out of
//! parents; assignment to an already-bound name in an enclosing scope
//! rebinds it there rather than shadowing, matching how `for`-loop counters
//! and accumulator variables are expected to behave across iterations.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, SuResult};
use crate::value::Value;

/// Names reserved for the foreign-language qualifier namespace (spec §3.1);
/// a plain variable may never bind one of these.
pub const RESERVED_LANGUAGE_NAMES: &[&str] = &["lua", "py", "python", "go", "js", "node"];

#[derive(Debug, Default)]
struct ScopeFrame {
    vars: HashMap<String, Value>,
}

/// A single lexical scope, cheaply cloneable (shares its parent chain via
/// `Rc`) the way reference-counted environment handles share their backing
/// storage.
#[derive(Debug, Clone)]
pub struct Scope {
    frame: Rc<RefCell<ScopeFrame>>,
    parent: Option<Box<Scope>>,
}

impl Scope {
    #[must_use]
    pub fn root() -> Self {
        Self { frame: Rc::new(RefCell::new(ScopeFrame::default())), parent: None }
    }

    /// Opens a new child scope nested under `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self { frame: Rc::new(RefCell::new(ScopeFrame::default())), parent: Some(Box::new(self.clone())) }
    }

    /// Reads a variable, walking outward through parent scopes.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.frame.borrow().vars.get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Reads a variable bound directly in *this* frame, without walking
    /// outward. Used to detect a name reused within one bitstring pattern
    /// match (spec §4.H step 6), where only bindings made by that same match
    /// matter, not an unrelated variable of the same name further out.
    #[must_use]
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.frame.borrow().vars.get(name).cloned()
    }

    /// Declares or rebinds `name` in *this* scope (used for `for`-loop
    /// induction variables and fresh locals).
    pub fn declare(&self, name: &str, value: Value) {
        self.frame.borrow_mut().vars.insert(name.to_string(), value);
    }

    /// Assigns to `name`, rebinding it in whichever scope already holds it,
    /// or declaring it fresh in `self` if no scope does (spec §4.L
    /// assignment semantics: plain `var = value`).
    pub fn assign(&self, name: &str, value: Value) -> SuResult<()> {
        if RESERVED_LANGUAGE_NAMES.contains(&name) {
            return Err(Error::new(
                crate::error::ErrorKind::Semantic,
                format!("'{name}' is a reserved language qualifier and cannot be assigned"),
            ));
        }
        if self.assign_existing(name, &value) {
            return Ok(());
        }
        self.declare(name, value);
        Ok(())
    }

    fn assign_existing(&self, name: &str, value: &Value) -> bool {
        if self.frame.borrow().vars.contains_key(name) {
            self.frame.borrow_mut().vars.insert(name.to_string(), value.clone());
            return true;
        }
        self.parent.as_ref().is_some_and(|p| p.assign_existing(name, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn child_sees_parent_bindings() {
        let root = Scope::root();
        root.declare("x", Value::Int(BigInt::from(1)));
        let child = root.child();
        assert!(matches!(child.get("x"), Some(Value::Int(_))));
    }

    #[test]
    fn assign_in_child_rebinds_parent_variable() {
        let root = Scope::root();
        root.declare("x", Value::Int(BigInt::from(1)));
        let child = root.child();
        child.assign("x", Value::Int(BigInt::from(2))).unwrap();
        match root.get("x") {
            Some(Value::Int(n)) => assert_eq!(n, BigInt::from(2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn assign_of_new_name_declares_locally() {
        let root = Scope::root();
        let child = root.child();
        child.assign("y", Value::Bool(true)).unwrap();
        assert!(root.get("y").is_none());
        assert!(child.get("y").is_some());
    }

    #[test]
    fn get_local_ignores_parent_bindings() {
        let root = Scope::root();
        root.declare("x", Value::Int(BigInt::from(1)));
        let child = root.child();
        assert!(child.get_local("x").is_none());
        assert!(child.get("x").is_some());
        child.declare("x", Value::Int(BigInt::from(2)));
        match child.get_local("x") {
            Some(Value::Int(n)) => assert_eq!(n, BigInt::from(2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reserved_language_name_rejected() {
        let root = Scope::root();
        assert!(root.assign("lua", Value::Nil).is_err());
    }
}
