//! Name tables for declaration lookup.
//!
//! A [`Scope`] maps names to declared nodes; a name is defined at most once
//! per table. [`Scopes`] is a stack of tables: shadowing is permitted
//! across levels, never within one, and lookups proceed innermost-first.
//! The root scope holds every top-level declaration.

use crate::node::NodeId;
use indexmap::IndexMap;

/// One level of name bindings, in declaration order.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    names: IndexMap<String, NodeId>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `node`. Returns false without rebinding when the
    /// name is already defined in this table.
    pub fn define(&mut self, name: &str, node: NodeId) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        self.names.insert(name.to_string(), node);
        true
    }

    /// Look up a name in this table only.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Declared node ids in declaration order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.names.values().copied()
    }
}

/// A stack of scopes, innermost last.
#[derive(Debug, Default)]
pub struct Scopes {
    stack: Vec<Scope>,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a fresh scope and return its index.
    pub fn push(&mut self) -> usize {
        self.stack.push(Scope::new());
        self.stack.len() - 1
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Look up a name, innermost scope first.
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        self.stack.iter().rev().find_map(|scope| scope.get(name))
    }

    /// The bottom-most scope, holding top-level declarations.
    pub fn root(&self) -> &Scope {
        &self.stack[0]
    }

    pub fn root_mut(&mut self) -> &mut Scope {
        &mut self.stack[0]
    }
}
