//! Name resolution for the bytecode compiler.
//!
//! Symbols live in one of four scopes: `Global` (top-level slots),
//! `Local` (frame slots), `Free` (captured from an enclosing function),
//! and `Builtin` (the fixed native table). Tables nest per function
//! scope; resolving a local through a function boundary records it as a
//! free symbol so the compiler can emit the capture.

use monkey_ir::{Name, StringInterner};
use monkey_object::BUILTINS;
use rustc_hash::FxHashMap;

/// Where a symbol's storage lives.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SymbolScope {
    Global,
    Local,
    Free,
    Builtin,
}

/// A resolved name: its scope and slot index within that scope.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Symbol {
    pub name: Name,
    pub scope: SymbolScope,
    pub index: usize,
}

/// One lexical scope's worth of symbols.
#[derive(Default, Debug)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: FxHashMap<Name, Symbol>,
    num_definitions: usize,
    free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    /// Create an empty global table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a global table with the builtin functions pre-defined in
    /// table order (their index is the `GetBuiltin` operand).
    pub fn with_builtins(interner: &StringInterner) -> Self {
        let mut table = Self::new();
        for (index, builtin) in BUILTINS.iter().enumerate() {
            table.define_builtin(index, interner.intern(builtin.name));
        }
        table
    }

    /// Create a table enclosed by `outer` (entering a function scope).
    pub fn enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Unwrap back to the enclosing table (leaving a function scope).
    pub fn into_outer(self) -> SymbolTable {
        debug_assert!(self.outer.is_some(), "into_outer on the global table");
        self.outer.map_or_else(SymbolTable::default, |outer| *outer)
    }

    /// Whether this is the global table.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    /// Number of definitions in this scope (the frame's local count).
    #[inline]
    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    /// Symbols captured from enclosing scopes, in capture order.
    #[inline]
    pub fn free_symbols(&self) -> &[Symbol] {
        &self.free_symbols
    }

    /// Define a name in this scope, allocating the next slot.
    pub fn define(&mut self, name: Name) -> Symbol {
        let scope = if self.is_global() {
            SymbolScope::Global
        } else {
            SymbolScope::Local
        };
        let symbol = Symbol {
            name,
            scope,
            index: self.num_definitions,
        };
        self.store.insert(name, symbol);
        self.num_definitions += 1;
        symbol
    }

    /// Define a builtin at a fixed table index.
    pub fn define_builtin(&mut self, index: usize, name: Name) -> Symbol {
        let symbol = Symbol {
            name,
            scope: SymbolScope::Builtin,
            index,
        };
        self.store.insert(name, symbol);
        symbol
    }

    /// Resolve a name, walking enclosing tables.
    ///
    /// A local (or free) symbol found beyond this table's function
    /// boundary is re-registered here as `Free`; the compiler emits the
    /// capture from `free_symbols` when it closes the scope.
    pub fn resolve(&mut self, name: Name) -> Option<Symbol> {
        if let Some(&symbol) = self.store.get(&name) {
            return Some(symbol);
        }
        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;
        match symbol.scope {
            SymbolScope::Global | SymbolScope::Builtin => Some(symbol),
            SymbolScope::Local | SymbolScope::Free => Some(self.define_free(symbol)),
        }
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original);
        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(original.name, symbol);
        symbol
    }
}
