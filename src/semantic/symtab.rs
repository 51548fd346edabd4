//! Scoped symbol table
//!
//! Bindings live in a stack of lexical scopes. Entering a scope pushes a
//! frame; leaving it drops every binding made inside, so a shadowed outer
//! binding becomes visible again. Scope 0 is the global scope and is never
//! popped.

use std::collections::HashMap;
use std::fmt::Write;

use log::{debug, trace};

use crate::types::TypeInfo;

/// A declared name with its storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    /// Line of the declaration
    pub line: usize,
    pub offset: i64,
    /// Size in storage units
    pub size: usize,
    pub scope: usize,
    pub ty: TypeInfo,
}

/// Symbol table with innermost-scope-wins lookup
#[derive(Debug)]
pub struct SymbolTable {
    /// Per-name binding stacks; the last entry shadows the others
    bindings: HashMap<String, Vec<SymbolEntry>>,
    /// Names declared in each open scope, in declaration order
    scopes: Vec<Vec<String>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            scopes: vec![Vec::new()],
        }
    }

    /// Drop every binding and return to the bare global scope
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.scopes = vec![Vec::new()];
    }

    /// Depth of the innermost open scope (0 = global)
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
        debug!("entered scope {}", self.depth());
    }

    /// Close the innermost scope, returning the bindings it held
    pub fn exit_scope(&mut self) -> Vec<SymbolEntry> {
        if self.scopes.len() <= 1 {
            return Vec::new();
        }

        let depth = self.depth();
        let names = self.scopes.pop().unwrap_or_default();
        let mut removed = Vec::with_capacity(names.len());
        for name in names.iter().rev() {
            if let Some(entry) = self.pop_binding(name) {
                removed.push(entry);
            }
        }
        removed.reverse();
        debug!("left scope {} ({} bindings dropped)", depth, removed.len());
        removed
    }

    /// Bind `name` in the innermost scope
    ///
    /// Duplicate detection is the caller's job; see [`SymbolTable::is_declared_in`].
    pub fn insert(
        &mut self,
        name: &str,
        line: usize,
        offset: i64,
        size: usize,
        scope: usize,
        ty: TypeInfo,
    ) {
        debug!(
            "insert '{}' at scope {} (offset {}, size {}, {})",
            name, scope, offset, size, ty
        );
        self.bindings
            .entry(name.to_string())
            .or_default()
            .push(SymbolEntry {
                name: name.to_string(),
                line,
                offset,
                size,
                scope,
                ty,
            });
        if let Some(frame) = self.scopes.last_mut() {
            frame.push(name.to_string());
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        let found = self.bindings.get(name).and_then(|stack| stack.last());
        trace!("lookup '{}' -> {:?}", name, found.map(|e| e.scope));
        found
    }

    /// Whether the visible binding of `name` was made at exactly `scope`
    pub fn is_declared_in(&self, name: &str, scope: usize) -> bool {
        self.lookup(name).map_or(false, |entry| entry.scope == scope)
    }

    /// Undo the most recent `insert` of `name`
    pub fn delete(&mut self, name: &str) -> Option<SymbolEntry> {
        let entry = self.pop_binding(name)?;
        if let Some(frame) = self
            .scopes
            .iter_mut()
            .rev()
            .find(|frame| frame.iter().any(|n| n == name))
        {
            if let Some(pos) = frame.iter().rposition(|n| n == name) {
                frame.remove(pos);
            }
        }
        debug!("deleted '{}' from scope {}", name, entry.scope);
        Some(entry)
    }

    fn pop_binding(&mut self, name: &str) -> Option<SymbolEntry> {
        let stack = self.bindings.get_mut(name)?;
        let entry = stack.pop();
        if stack.is_empty() {
            self.bindings.remove(name);
        }
        entry
    }

    /// Bindings of one open scope in declaration order
    pub fn scope_entries(&self, depth: usize) -> Vec<&SymbolEntry> {
        let Some(names) = self.scopes.get(depth) else {
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| {
                self.bindings
                    .get(name)?
                    .iter()
                    .rev()
                    .find(|entry| entry.scope == depth)
            })
            .collect()
    }

    /// Tabular listing of every open scope
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<14}{:>6}{:>8}{:>6}{:>6}  {}",
            "Name", "Scope", "Offset", "Size", "Line", "Type"
        );
        let _ = writeln!(
            out,
            "{:<14}{:>6}{:>8}{:>6}{:>6}  {}",
            "----", "-----", "------", "----", "----", "----"
        );
        for depth in 0..self.scopes.len() {
            for entry in self.scope_entries(depth) {
                let _ = writeln!(
                    out,
                    "{:<14}{:>6}{:>8}{:>6}{:>6}  {}",
                    entry.name, entry.scope, entry.offset, entry.size, entry.line, entry.ty
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_innermost_scope_wins() {
        let mut table = SymbolTable::new();
        table.insert("x", 1, 0, 1, 0, TypeInfo::Integer);

        table.enter_scope();
        table.insert("x", 4, -2, 1, 1, TypeInfo::Float);
        assert_eq!(table.lookup("x").unwrap().ty, TypeInfo::Float);
        assert!(table.is_declared_in("x", 1));

        let dropped = table.exit_scope();
        assert_eq!(dropped.len(), 1);
        assert_eq!(table.lookup("x").unwrap().ty, TypeInfo::Integer);
        assert!(!table.is_declared_in("x", 1));
    }

    #[test]
    fn test_delete_undoes_one_insert() {
        let mut table = SymbolTable::new();
        table.insert("n", 1, 0, 1, 0, TypeInfo::Integer);
        table.enter_scope();
        table.insert("n", 2, 1, 1, 1, TypeInfo::Boolean);

        let removed = table.delete("n").unwrap();
        assert_eq!(removed.scope, 1);
        assert_eq!(table.lookup("n").unwrap().scope, 0);

        table.delete("n");
        assert!(table.lookup("n").is_none());
        assert!(table.delete("n").is_none());
        assert!(table.exit_scope().is_empty());
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut table = SymbolTable::new();
        table.insert("g", 1, 0, 1, 0, TypeInfo::Integer);
        assert!(table.exit_scope().is_empty());
        assert_eq!(table.depth(), 0);
        assert!(table.lookup("g").is_some());
    }

    #[test]
    fn test_scope_entries_and_render() {
        let mut table = SymbolTable::new();
        table.insert("a", 1, 0, 1, 0, TypeInfo::Integer);
        table.insert("b", 2, -3, 3, 0, TypeInfo::array_of(TypeInfo::Float, 3));

        let names: Vec<&str> = table.scope_entries(0).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let listing = table.render();
        assert!(listing.starts_with("Name"));
        assert!(listing.contains("float[3]"));
        assert_eq!(listing.lines().count(), 4);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.insert("t", 1, 1, 1, 1, TypeInfo::Integer);
        table.clear();
        assert_eq!(table.depth(), 0);
        assert!(table.lookup("t").is_none());
    }
}
