use std::collections::HashMap;
use std::f64::consts::{E, PI};

use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: f64,
    pub mutable: bool,
}

/// Named numeric bindings, seeded with the read-only constants `pi` and `e`.
///
/// Entries are never removed. Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct VariableStore {
    entries: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableStore {
    pub fn new() -> Self {
        let mut store = VariableStore {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        store.insert("pi", PI, false);
        store.insert("e", E, false);
        store
    }

    fn insert(&mut self, name: &str, value: f64, mutable: bool) {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(Variable {
            name: name.to_string(),
            value,
            mutable,
        });
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).map(|var| var.value)
    }

    /// Binds `name` to `0.0` unless it is already bound.
    pub fn declare_if_absent(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            debug!(name, "auto-declaring variable");
            self.insert(name, 0.0, true);
        }
    }

    /// Writes to a constant are ignored without error.
    pub fn assign(&mut self, name: &str, value: f64) {
        match self.index.get(name) {
            Some(&i) => {
                let var = &mut self.entries[i];
                if var.mutable {
                    info!(name, value, "variable updated");
                    var.value = value;
                } else {
                    debug!(name, "ignoring write to constant");
                }
            }
            None => {
                info!(name, value, "variable declared");
                self.insert(name, value, true);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for VariableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_with_constants() {
        let store = VariableStore::new();
        assert_eq!(store.lookup("pi"), Some(PI));
        assert_eq!(store.lookup("e"), Some(E));
        assert!(!store.get("pi").unwrap().mutable);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn constants_ignore_assignment() {
        let mut store = VariableStore::new();
        store.assign("pi", 3.0);
        store.assign("e", 0.0);
        assert_eq!(store.lookup("pi"), Some(PI));
        assert_eq!(store.lookup("e"), Some(E));
    }

    #[test]
    fn assign_creates_then_overwrites() {
        let mut store = VariableStore::new();
        store.assign("x", 5.0);
        assert_eq!(store.lookup("x"), Some(5.0));
        store.assign("x", -1.5);
        assert_eq!(store.lookup("x"), Some(-1.5));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn declare_if_absent_keeps_existing_value() {
        let mut store = VariableStore::new();
        store.declare_if_absent("y");
        assert_eq!(store.lookup("y"), Some(0.0));
        store.assign("y", 4.0);
        store.declare_if_absent("y");
        assert_eq!(store.lookup("y"), Some(4.0));
    }

    #[test]
    fn iterates_in_insertion_order() {
        let mut store = VariableStore::new();
        store.assign("b", 1.0);
        store.declare_if_absent("a");
        let names: Vec<&str> = store.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["pi", "e", "b", "a"]);
    }
}
