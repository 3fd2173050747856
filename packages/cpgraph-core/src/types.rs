//! Type manager: structural interning of type descriptors.
//!
//! Translation-scoped like the scope manager. `register_type` is
//! linearizable: the interning table is a concurrent map keyed by the
//! descriptor's canonical structural key, so parallel frontends registering
//! the same type always observe one canonical node. Created type nodes are
//! buffered here and drained into the result arena at finalization.

use crate::node::{Node, NodeIdAllocator, NodeId, NodeKind};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Structural description of a type, independent of any language's
/// spelling of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub generics: Vec<TypeDescriptor>,
    /// Levels of indirection (`T` = 0, `*T` = 1, ...).
    pub pointer_depth: u8,
}

impl TypeDescriptor {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generics: Vec::new(),
            pointer_depth: 0,
        }
    }

    pub fn pointer_to(mut self) -> Self {
        self.pointer_depth += 1;
        self
    }

    pub fn with_generics(mut self, generics: Vec<TypeDescriptor>) -> Self {
        self.generics = generics;
        self
    }

    /// Canonical key; structurally equal descriptors produce equal keys.
    pub fn structural_key(&self) -> String {
        let mut key = String::new();
        for _ in 0..self.pointer_depth {
            key.push('*');
        }
        key.push_str(&self.name);
        if !self.generics.is_empty() {
            key.push('<');
            for (i, g) in self.generics.iter().enumerate() {
                if i > 0 {
                    key.push(',');
                }
                key.push_str(&g.structural_key());
            }
            key.push('>');
        }
        key
    }
}

pub struct TypeManager {
    interned: DashMap<String, NodeId>,
    created: Mutex<Vec<Node>>,
}

impl TypeManager {
    pub fn new() -> Self {
        Self {
            interned: DashMap::new(),
            created: Mutex::new(Vec::new()),
        }
    }

    /// De-duplicates by structural key and returns the canonical type node
    /// identity, creating it on first sight.
    pub fn register_type(&self, descriptor: &TypeDescriptor, alloc: &NodeIdAllocator) -> NodeId {
        let key = descriptor.structural_key();
        *self
            .interned
            .entry(key.clone())
            .or_insert_with(|| {
                let id = alloc.next_id();
                self.created
                    .lock()
                    .push(Node::new(id, NodeKind::Type { key }, descriptor.name.clone()));
                id
            })
            .value()
    }

    /// Canonical node for a key already registered, if any.
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.interned.get(key).map(|entry| *entry.value())
    }

    /// Drains the buffered type nodes for merging into the result arena,
    /// ordered by identity so output stays deterministic.
    pub fn take_nodes(&self) -> Vec<Node> {
        let mut nodes = std::mem::take(&mut *self.created.lock());
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    pub fn type_count(&self) -> usize {
        self.interned.len()
    }

    /// Drops the interning table. The exported result keeps its type nodes.
    pub fn clear(&self) {
        self.interned.clear();
        self.created.lock().clear();
    }
}

impl Default for TypeManager {
    fn default() -> Self {
        Self::new()
    }
}
