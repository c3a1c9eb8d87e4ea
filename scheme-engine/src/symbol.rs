//! Symbol interning.
//!
//! Symbols are interned so that equality is a handle comparison instead of
//! a string compare. The table is append-only and process-wide: once a
//! [`SymbolId`] is handed out it stays valid for the remainder of the run.

use crate::declare_id;

declare_id!(pub struct SymbolId(u16));

/// Reserved symbols, interned in this exact order by [`SymbolTable::new`] so
/// their ids are fixed constants below. Lets the compiler dispatch special
/// forms by identity instead of re-comparing strings on every form.
const RESERVED: &[&str] = &[
    "set!",
    "define",
    "lambda",
    "if",
    "quote",
    "define-syntax",
    "save-scope",
    "...",
    ".",
];

impl SymbolId {
    pub const SET: SymbolId = SymbolId(0);
    pub const DEFINE: SymbolId = SymbolId(1);
    pub const LAMBDA: SymbolId = SymbolId(2);
    pub const IF: SymbolId = SymbolId(3);
    pub const QUOTE: SymbolId = SymbolId(4);
    pub const DEFINE_SYNTAX: SymbolId = SymbolId(5);
    pub const SAVE_SCOPE: SymbolId = SymbolId(6);
    pub const ELLIPSIS: SymbolId = SymbolId(7);
    pub const DOT: SymbolId = SymbolId(8);
}

#[derive(Debug)]
pub struct SymbolTable {
    symbols: Vec<String>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
        };
        for name in RESERVED {
            table.intern_symbol(*name);
        }
        table
    }

    pub fn resolve(&self, name_query: impl AsRef<str>) -> Option<SymbolId> {
        let name_query = name_query.as_ref();
        self.symbols
            .iter()
            .position(|name| name.as_str() == name_query)
            .map(|index| SymbolId(index as u16))
    }

    pub fn intern_symbol(&mut self, name: impl ToString) -> SymbolId {
        let name = name.to_string();

        match self.resolve(name.as_str()) {
            Some(symbol) => symbol,
            None => {
                let next_index = self.symbols.len();
                self.symbols.push(name);
                SymbolId(next_index as u16)
            }
        }
    }

    pub fn insert_unique(&mut self, name: impl ToString) -> Option<SymbolId> {
        let name = name.to_string();

        match self.resolve(name.as_str()) {
            Some(_) => None,
            None => {
                let next_index = self.symbols.len();
                self.symbols.push(name);
                Some(SymbolId(next_index as u16))
            }
        }
    }

    pub fn name(&self, symbol: SymbolId) -> &str {
        self.symbols
            .get(symbol.as_usize())
            .map(String::as_str)
            .unwrap_or("<unknown-symbol>")
    }

    pub fn items(&self) -> impl Iterator<Item = (SymbolId, &str)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(index, name)| (SymbolId(index as u16), name.as_str()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_intern_roundtrip() {
        let mut table = SymbolTable::new();
        let a = table.intern_symbol("hello");
        let b = table.intern_symbol("hello");
        assert_eq!(a, b);
        assert_eq!(table.name(a), "hello");
    }

    #[test]
    fn test_reserved_symbols_stable() {
        let table = SymbolTable::new();
        assert_eq!(table.resolve("lambda"), Some(SymbolId::LAMBDA));
        assert_eq!(table.resolve("if"), Some(SymbolId::IF));
        assert_eq!(table.resolve("..."), Some(SymbolId::ELLIPSIS));
    }

    #[test]
    fn test_new_symbols_get_fresh_ids_after_reserved() {
        let mut table = SymbolTable::new();
        let reserved_count = RESERVED.len() as u16;
        let first_user_symbol = table.intern_symbol("my-var");
        assert_eq!(first_user_symbol, SymbolId(reserved_count));
    }

    #[test]
    fn test_insert_unique_rejects_duplicates() {
        let mut table = SymbolTable::new();
        assert!(table.insert_unique("foo").is_some());
        assert!(table.insert_unique("foo").is_none());
    }
}
