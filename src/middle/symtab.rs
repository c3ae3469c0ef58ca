//! The symbol table: a single flat, ordered list of symbols with scope
//! tags. There is no nested-frame structure — one level of procedure/
//! function nesting is handled entirely by `delete` clearing locals and
//! parameters when a subprogram body finishes emitting.

use crate::common::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    GlobalVar,
    LocalVar,
    Proc,
    Param,
    Func,
    Array,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Id,
    pub scope: Scope,
    /// `(lo, hi)` for `Scope::Array` symbols; `lo <= hi`.
    pub bounds: Option<(i32, i32)>,
}

impl Symbol {
    pub fn array_size(&self) -> Option<i32> {
        self.bounds.map(|(lo, hi)| hi - lo + 1)
    }
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    rows: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Append a new symbol. No uniqueness check — an inner declaration is
    /// free to shadow an outer one of the same name; `lookup` resolves the
    /// ambiguity by scanning newest-first.
    pub fn insert(&mut self, name: Id, scope: Scope) {
        self.rows.push(Symbol {
            name,
            scope,
            bounds: None,
        });
    }

    /// Attach array bounds to the most recently inserted symbol. Callers
    /// always call this immediately after `insert(name, Scope::Array)`.
    pub fn set_array_bounds(&mut self, bounds: (i32, i32)) {
        self.rows.last_mut().expect("insert before set_array_bounds").bounds = Some(bounds);
    }

    /// Most recently inserted symbol named `name`, scanning tail to head so
    /// inner scopes shadow outer ones.
    pub fn lookup(&self, name: Id) -> Option<&Symbol> {
        self.rows.iter().rev().find(|s| s.name == name)
    }

    /// Remove every `LocalVar`/`Param` symbol, preserving the relative
    /// order of the survivors. Called at the end of every procedure and
    /// function body.
    pub fn delete(&mut self) {
        self.rows
            .retain(|s| !matches!(s.scope, Scope::LocalVar | Scope::Param));
    }

    /// All symbols currently in the table, in insertion order.
    pub fn rows(&self) -> &[Symbol] {
        &self.rows
    }
}
