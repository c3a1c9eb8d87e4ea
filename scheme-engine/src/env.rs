//! The scope chain (spec.md §4.4) and the process-wide interpreter
//! context that ties the symbol table, the top scope and its immutable
//! snapshot together.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::macros::MacroTable;
use crate::symbol::{SymbolId, SymbolTable};
use crate::value::Value;

/// A mapping from symbol to value, plus an optional parent. Lookup walks
/// parents until the symbol is found or the chain ends.
#[derive(Debug)]
pub struct Scope {
    vars: HashMap<SymbolId, Value>,
    parent: Option<Handle<Scope>>,
}

impl Scope {
    pub fn root() -> Handle<Scope> {
        Handle::new(Scope {
            vars: HashMap::new(),
            parent: None,
        })
    }

    pub fn child_of(parent: &Handle<Scope>) -> Handle<Scope> {
        Handle::new(Scope {
            vars: HashMap::new(),
            parent: Some(parent.clone()),
        })
    }

    /// An immutable-in-spirit copy of `scope`'s bindings with no parent,
    /// used for `BaseScope` / `scheme-report-environment`. Nothing stops
    /// later mutation through the handle; callers are trusted not to.
    pub fn snapshot(scope: &Handle<Scope>) -> Handle<Scope> {
        Handle::new(Scope {
            vars: scope.borrow().vars.clone(),
            parent: None,
        })
    }

    /// Insert `sym` into this scope specifically, answering whether this
    /// rebinds an existing entry (callers use this to warn on redefinition).
    pub fn define(scope: &Handle<Scope>, sym: SymbolId, value: Value) -> bool {
        scope.borrow_mut().vars.insert(sym, value).is_some()
    }

    /// Walk the chain looking for the owning scope of `sym`.
    pub fn owner_of(scope: &Handle<Scope>, sym: SymbolId) -> Option<Handle<Scope>> {
        if scope.borrow().vars.contains_key(&sym) {
            return Some(scope.clone());
        }
        let parent = scope.borrow().parent.clone()?;
        Scope::owner_of(&parent, sym)
    }

    /// Mutate `sym`'s binding wherever it's owned; if unbound, create it in
    /// `scope` (spec.md §4.4, §8 property 6).
    pub fn set(scope: &Handle<Scope>, sym: SymbolId, value: Value) {
        match Scope::owner_of(scope, sym) {
            Some(owner) => {
                owner.borrow_mut().vars.insert(sym, value);
            }
            None => {
                scope.borrow_mut().vars.insert(sym, value);
            }
        }
    }

    /// Read `sym`'s value, walking parents.
    pub fn get(scope: &Handle<Scope>, sym: SymbolId) -> Option<Value> {
        if let Some(value) = scope.borrow().vars.get(&sym) {
            return Some(value.clone());
        }
        let parent = scope.borrow().parent.clone()?;
        Scope::get(&parent, sym)
    }

    pub fn parent(&self) -> Option<&Handle<Scope>> {
        self.parent.as_ref()
    }
}

/// Resolve the chain walk's starting point and plain symbol id for a value
/// that names a variable: either a bare `Symbol`, or a `Scoped` symbol,
/// which redirects the walk to start at its introduction scope instead of
/// the caller-supplied current scope (spec.md §4.4).
pub fn resolve_start(current: &Handle<Scope>, value: &Value) -> Result<(Handle<Scope>, SymbolId)> {
    match value {
        Value::Symbol(sym) => Ok((current.clone(), *sym)),
        Value::Scoped(sym, scope) => Ok((scope.clone(), *sym)),
        _ => Err(Error::Compile(
            "expected a symbol in variable position".to_string(),
        )),
    }
}

/// The process-wide interpreter context: the symbol table, the root scope
/// of the chain ("TopScope"), and its immutable snapshot ("BaseScope").
///
/// Kept as an explicit, constructible value rather than global statics so
/// multiple independent interpreters can coexist in one process (spec.md
/// §9's "thread an `Interpreter` context" option, preferred for testing).
pub struct Env {
    pub symbols: SymbolTable,
    pub top: Handle<Scope>,
    pub base: Handle<Scope>,
    /// The macro table visible to top-level forms. Persists across
    /// successive REPL reads / file top-level forms the way the reference
    /// interpreter's single long-lived top-level procedure does.
    pub top_macros: Handle<MacroTable>,
}

impl Env {
    pub fn new() -> Env {
        let top = Scope::root();
        let base = Scope::snapshot(&top);
        Env {
            symbols: SymbolTable::new(),
            top,
            base,
            top_macros: Handle::new(MacroTable::new()),
        }
    }

    /// Re-snapshot `BaseScope` from the current `TopScope`. Used once
    /// after the core builtins and prelude are loaded, so
    /// `scheme-report-environment` sees library procedures too.
    pub fn refresh_base(&mut self) {
        self.base = Scope::snapshot(&self.top);
    }

    pub fn intern(&mut self, name: impl ToString) -> SymbolId {
        self.symbols.intern_symbol(name)
    }

    pub fn define_top(&mut self, name: &str, value: Value) {
        let sym = self.intern(name);
        Scope::define(&self.top, sym, value);
    }
}

impl Default for Env {
    fn default() -> Self {
        Env::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chain_lookup_walks_parents() {
        let mut table = SymbolTable::new();
        let sym = table.intern_symbol("x");

        let root = Scope::root();
        Scope::define(&root, sym, Value::Integer(1.into()));
        let child = Scope::child_of(&root);

        assert!(matches!(Scope::get(&child, sym), Some(Value::Integer(_))));
    }

    #[test]
    fn test_set_on_unbound_creates_in_current_scope() {
        let mut table = SymbolTable::new();
        let sym = table.intern_symbol("count");

        let root = Scope::root();
        let child = Scope::child_of(&root);
        Scope::set(&child, sym, Value::Integer(0.into()));

        assert!(Scope::owner_of(&root, sym).is_none());
        assert!(Scope::owner_of(&child, sym).is_some());
    }

    #[test]
    fn test_set_mutates_owning_scope_not_current() {
        let mut table = SymbolTable::new();
        let sym = table.intern_symbol("count");

        let root = Scope::root();
        Scope::define(&root, sym, Value::Integer(0.into()));
        let child = Scope::child_of(&root);
        Scope::set(&child, sym, Value::Integer(1.into()));

        match Scope::get(&root, sym) {
            Some(Value::Integer(n)) => assert_eq!(n, 1.into()),
            _ => panic!("expected integer"),
        }
    }
}
