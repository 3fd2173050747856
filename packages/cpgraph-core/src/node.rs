//! Graph node model.
//!
//! Every graph element is a [`Node`] with a stable identity, a kind from a
//! closed taxonomy, an optional source location and an optional verbatim
//! code snippet. Nodes never own each other; structure is expressed through
//! identity-referencing edges owned by the translation result.

use crate::edge::EdgeKind;
use crate::scope::ScopeId;
use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable node identity, unique within one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Monotonic identity source shared by all frontends and passes of one
/// translation. Allocation is wait-free so parallel frontends never hand
/// out the same id.
#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    next: AtomicU64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of identities handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Closed node taxonomy. Variants carry the per-kind payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Top-level node for one source file (or one unity-merged group).
    TranslationUnit,
    NamespaceDecl,
    /// Import of another unit or namespace by name.
    ImportDecl { source: String },
    /// Class/struct-like declaration with the names of its supertypes.
    RecordDecl { superclasses: Vec<String> },
    FunctionDecl,
    ParameterDecl { type_name: Option<String> },
    VariableDecl { type_name: Option<String> },
    Block,
    ReturnStmt,
    /// Assignment; AST children are target then value.
    AssignExpr,
    /// Call; the node name is the callee name.
    CallExpr,
    /// Use of a declared name; the node name is the referenced name.
    Reference,
    Literal { value: String },
    /// Canonical type node interned by the type manager.
    Type { key: String },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnit => "TranslationUnit",
            NodeKind::NamespaceDecl => "NamespaceDecl",
            NodeKind::ImportDecl { .. } => "ImportDecl",
            NodeKind::RecordDecl { .. } => "RecordDecl",
            NodeKind::FunctionDecl => "FunctionDecl",
            NodeKind::ParameterDecl { .. } => "ParameterDecl",
            NodeKind::VariableDecl { .. } => "VariableDecl",
            NodeKind::Block => "Block",
            NodeKind::ReturnStmt => "ReturnStmt",
            NodeKind::AssignExpr => "AssignExpr",
            NodeKind::CallExpr => "CallExpr",
            NodeKind::Reference => "Reference",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::Type { .. } => "Type",
        }
    }

    /// Whether this kind declares something a reference can resolve to.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::NamespaceDecl
                | NodeKind::RecordDecl { .. }
                | NodeKind::FunctionDecl
                | NodeKind::ParameterDecl { .. }
                | NodeKind::VariableDecl { .. }
        )
    }

    /// Allowed outgoing edge labels for this kind.
    pub fn allows_edge(&self, kind: EdgeKind) -> bool {
        use EdgeKind::*;
        match self {
            NodeKind::TranslationUnit => matches!(kind, Ast | Includes),
            NodeKind::NamespaceDecl => matches!(kind, Ast),
            NodeKind::ImportDecl { .. } => matches!(kind, Imports),
            NodeKind::RecordDecl { .. } => matches!(kind, Ast | Extends | TypeUsage),
            NodeKind::FunctionDecl => matches!(kind, Ast | Eog | TypeUsage),
            NodeKind::ParameterDecl { .. } => matches!(kind, Dfg | TypeUsage),
            NodeKind::VariableDecl { .. } => matches!(kind, Ast | Dfg | Eog | TypeUsage),
            NodeKind::Block => matches!(kind, Ast | Eog),
            NodeKind::ReturnStmt => matches!(kind, Ast | Eog),
            NodeKind::AssignExpr => matches!(kind, Ast | Eog | Dfg),
            NodeKind::CallExpr => matches!(kind, Ast | Eog | Dfg | Invokes),
            NodeKind::Reference => matches!(kind, Eog | Dfg | RefersTo),
            NodeKind::Literal { .. } => matches!(kind, Eog | Dfg),
            NodeKind::Type { .. } => matches!(kind, Extends),
        }
    }
}

/// A single graph element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Possibly qualified name; empty for anonymous nodes.
    pub name: String,
    pub location: Option<SourceLocation>,
    /// Display name of the language the producing frontend speaks.
    pub language: Option<String>,
    /// Enclosing lexical scope, set by the producing frontend.
    pub scope: Option<ScopeId>,
    /// Verbatim source snippet, present when `code_in_nodes` is enabled.
    pub code: Option<String>,
    /// Set on declarations fabricated by inference rather than parsed.
    pub inferred: bool,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            location: None,
            language: None,
            scope: None,
            code: None,
            inferred: false,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn in_scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn mark_inferred(mut self) -> Self {
        self.inferred = true;
        self
    }
}
