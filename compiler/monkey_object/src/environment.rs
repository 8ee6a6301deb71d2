//! Lexical scope chain for the evaluator.
//!
//! A scope is a name→value map plus an optional outer handle; lookups
//! walk outward. Handles are reference-counted with interior
//! mutability: a closure keeps its defining chain alive independently
//! of any caller frame, and `define` on a shared scope is visible
//! through every handle.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use monkey_ir::Name;
use rustc_hash::FxHashMap;

use crate::Value;

/// A single scope: bindings plus the enclosing scope.
#[derive(Default)]
pub struct Scope {
    bindings: FxHashMap<Name, Value>,
    outer: Option<Env>,
}

/// Shared handle to a scope.
///
/// Cloning is a reference-count bump; clones see each other's
/// definitions. Single-threaded by design (`Rc`, not `Arc`).
#[derive(Clone)]
pub struct Env(Rc<RefCell<Scope>>);

impl Env {
    /// Create a fresh top-level environment.
    pub fn new() -> Self {
        Env(Rc::new(RefCell::new(Scope::default())))
    }

    /// Create an environment enclosed by `outer`.
    ///
    /// Function calls get one of these per invocation, with the
    /// closure's captured environment as the outer link.
    pub fn enclosed(outer: Env) -> Self {
        Env(Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            outer: Some(outer),
        })))
    }

    /// Bind a name in this scope, shadowing any outer binding.
    pub fn define(&self, name: Name, value: Value) {
        self.0.borrow_mut().bindings.insert(name, value);
    }

    /// Look up a name, walking the outer chain.
    pub fn get(&self, name: Name) -> Option<Value> {
        let scope = self.0.borrow();
        if let Some(value) = scope.bindings.get(&name) {
            return Some(value.clone());
        }
        scope.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Identity comparison of the underlying scope.
    #[inline]
    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    // Bindings are omitted: a closure stored in the scope it captures
    // would make a full listing recurse forever.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        write!(
            f,
            "Env({} bindings{})",
            scope.bindings.len(),
            if scope.outer.is_some() { ", outer" } else { "" }
        )
    }
}
