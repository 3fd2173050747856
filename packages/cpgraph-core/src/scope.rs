//! Scope manager: lexical regions and symbol resolution.
//!
//! Translation-scoped service shared by all frontends and passes. The scope
//! tree is an append-only arena behind a read-write lock; each scope's
//! symbol table sits behind its own lock so concurrent frontends can
//! declare into disjoint scopes without contending. The enter/leave stack
//! is kept per worker thread, which preserves stack discipline under
//! parallel parsing.

use crate::error::{CoreError, Result};
use crate::node::NodeId;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread::ThreadId;

/// Identity of a scope record within one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Global,
    Namespace,
    Record,
    Function,
    Block,
}

struct ScopeData {
    kind: ScopeKind,
    /// AST node owning this region; the global scope has none.
    owner: Option<NodeId>,
    parent: Option<ScopeId>,
    symbols: RwLock<FxHashMap<String, NodeId>>,
}

pub struct ScopeManager {
    scopes: RwLock<Vec<Arc<ScopeData>>>,
    stacks: DashMap<ThreadId, Vec<ScopeId>>,
}

impl ScopeManager {
    /// Creates the manager with a fresh global scope at index 0.
    pub fn new() -> Self {
        let global = Arc::new(ScopeData {
            kind: ScopeKind::Global,
            owner: None,
            parent: None,
            symbols: RwLock::new(FxHashMap::default()),
        });
        Self {
            scopes: RwLock::new(vec![global]),
            stacks: DashMap::new(),
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    fn get(&self, id: ScopeId) -> Option<Arc<ScopeData>> {
        self.scopes.read().get(id.0 as usize).cloned()
    }

    /// Creates a new scope under the calling thread's current scope.
    pub fn new_scope(&self, kind: ScopeKind, owner: NodeId) -> ScopeId {
        let parent = self.current_scope();
        let mut scopes = self.scopes.write();
        let id = ScopeId(scopes.len() as u32);
        scopes.push(Arc::new(ScopeData {
            kind,
            owner: Some(owner),
            parent: Some(parent),
            symbols: RwLock::new(FxHashMap::default()),
        }));
        id
    }

    /// Innermost scope of the calling thread, the global scope when the
    /// thread has not entered any.
    pub fn current_scope(&self) -> ScopeId {
        self.stacks
            .get(&std::thread::current().id())
            .and_then(|stack| stack.last().copied())
            .unwrap_or_else(|| self.global_scope())
    }

    pub fn enter_scope(&self, id: ScopeId) -> Result<()> {
        if self.get(id).is_none() {
            return Err(CoreError::UnknownScope(id));
        }
        self.stacks
            .entry(std::thread::current().id())
            .or_default()
            .push(id);
        Ok(())
    }

    /// Leaves a scope; fails when `id` is not on top of the calling
    /// thread's stack.
    pub fn leave_scope(&self, id: ScopeId) -> Result<()> {
        let mut stack = self
            .stacks
            .entry(std::thread::current().id())
            .or_default();
        match stack.last().copied() {
            Some(top) if top == id => {
                stack.pop();
                Ok(())
            }
            top => Err(CoreError::ScopeMismatch { left: id, top }),
        }
    }

    /// Declares `name` in `scope`; returns the shadowed declaration when
    /// the name was already bound in that scope. Clashes are non-fatal and
    /// left to the caller to record.
    pub fn declare(&self, scope: ScopeId, name: impl Into<String>, node: NodeId) -> Option<NodeId> {
        let data = self.get(scope)?;
        let result = data.symbols.write().insert(name.into(), node);
        result
    }

    /// Innermost declaration of `name` visible from `from`, walking the
    /// ancestor chain under shared locks.
    pub fn resolve(&self, name: &str, from: ScopeId) -> Option<NodeId> {
        let mut cursor = self.get(from);
        while let Some(data) = cursor {
            if let Some(&node) = data.symbols.read().get(name) {
                return Some(node);
            }
            cursor = data.parent.and_then(|p| self.get(p));
        }
        None
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.get(id)?.parent
    }

    pub fn kind(&self, id: ScopeId) -> Option<ScopeKind> {
        self.get(id).map(|d| d.kind)
    }

    pub fn owner(&self, id: ScopeId) -> Option<NodeId> {
        self.get(id)?.owner
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().len()
    }

    /// Drops all per-translation state, leaving a fresh global scope.
    pub fn clear(&self) {
        let mut scopes = self.scopes.write();
        scopes.clear();
        scopes.push(Arc::new(ScopeData {
            kind: ScopeKind::Global,
            owner: None,
            parent: None,
            symbols: RwLock::new(FxHashMap::default()),
        }));
        self.stacks.clear();
    }
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_discipline() {
        let mgr = ScopeManager::new();
        let f = mgr.new_scope(ScopeKind::Function, NodeId(1));
        mgr.enter_scope(f).unwrap();
        let b = mgr.new_scope(ScopeKind::Block, NodeId(2));
        mgr.enter_scope(b).unwrap();

        // Leaving the function while the block is on top must fail.
        assert!(matches!(
            mgr.leave_scope(f),
            Err(CoreError::ScopeMismatch { .. })
        ));

        mgr.leave_scope(b).unwrap();
        mgr.leave_scope(f).unwrap();
        assert_eq!(mgr.current_scope(), mgr.global_scope());
    }

    #[test]
    fn test_resolve_walks_ancestors() {
        let mgr = ScopeManager::new();
        mgr.declare(mgr.global_scope(), "x", NodeId(10));

        let f = mgr.new_scope(ScopeKind::Function, NodeId(1));
        mgr.enter_scope(f).unwrap();
        let b = mgr.new_scope(ScopeKind::Block, NodeId(2));

        // Visible from the inner block through the chain.
        assert_eq!(mgr.resolve("x", b), Some(NodeId(10)));

        // Shadowing: innermost wins.
        mgr.declare(b, "x", NodeId(20));
        assert_eq!(mgr.resolve("x", b), Some(NodeId(20)));
        assert_eq!(mgr.resolve("x", f), Some(NodeId(10)));

        assert_eq!(mgr.resolve("missing", b), None);
        mgr.leave_scope(f).unwrap();
    }

    #[test]
    fn test_declare_reports_clash() {
        let mgr = ScopeManager::new();
        let g = mgr.global_scope();
        assert_eq!(mgr.declare(g, "f", NodeId(1)), None);
        assert_eq!(mgr.declare(g, "f", NodeId(2)), Some(NodeId(1)));
    }

    #[test]
    fn test_clear_resets_tree() {
        let mgr = ScopeManager::new();
        let f = mgr.new_scope(ScopeKind::Function, NodeId(1));
        mgr.declare(f, "y", NodeId(3));
        assert_eq!(mgr.scope_count(), 2);

        mgr.clear();
        assert_eq!(mgr.scope_count(), 1);
        assert_eq!(mgr.resolve("y", mgr.global_scope()), None);
    }
}
