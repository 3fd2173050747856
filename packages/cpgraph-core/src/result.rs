//! Translation result: the owning arena for one end-to-end run.
//!
//! Nodes live in an id-keyed arena with a separate insertion-order list so
//! iteration is deterministic. Edges are stored flat with per-node
//! outgoing/incoming indices for the queries passes actually run.

use crate::diagnostics::Diagnostic;
use crate::edge::{Edge, EdgeKind};
use crate::error::{CoreError, Result};
use crate::node::{Node, NodeId, NodeKind};
use crate::scope::ScopeId;
use rustc_hash::FxHashMap;

/// How a translation ended. `Cancelled` results still carry every
/// enrichment applied before the token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslationStatus {
    #[default]
    Complete,
    Cancelled,
}

#[derive(Debug)]
pub struct TranslationResult {
    nodes: FxHashMap<NodeId, Node>,
    order: Vec<NodeId>,
    edges: Vec<Edge>,
    outgoing: FxHashMap<NodeId, Vec<usize>>,
    incoming: FxHashMap<NodeId, Vec<usize>>,
    translation_units: Vec<NodeId>,
    type_nodes: Vec<NodeId>,
    root_scope: Option<ScopeId>,
    diagnostics: Vec<Diagnostic>,
    status: TranslationStatus,
}

impl TranslationResult {
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            order: Vec::new(),
            edges: Vec::new(),
            outgoing: FxHashMap::default(),
            incoming: FxHashMap::default(),
            translation_units: Vec::new(),
            type_nodes: Vec::new(),
            root_scope: None,
            diagnostics: Vec::new(),
            status: TranslationStatus::default(),
        }
    }

    // ─── nodes ───────────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(CoreError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        self.order.push(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ─── edges ───────────────────────────────────────────────────────────

    /// Adds an edge, validating both endpoints, the source kind's allowed
    /// labels, and the single-AST-parent invariant.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        let from = self
            .nodes
            .get(&edge.from)
            .ok_or(CoreError::UnknownNode(edge.from))?;
        if !self.nodes.contains_key(&edge.to) {
            return Err(CoreError::UnknownNode(edge.to));
        }
        if !from.kind.allows_edge(edge.kind) {
            return Err(CoreError::invalid_edge(format!(
                "{} node {} may not carry an outgoing {} edge",
                from.kind.label(),
                edge.from,
                edge.kind
            )));
        }
        if edge.kind == EdgeKind::Ast && self.ast_parent(edge.to).is_some() {
            return Err(CoreError::invalid_edge(format!(
                "node {} already has an AST parent",
                edge.to
            )));
        }

        let index = self.edges.len();
        self.outgoing.entry(edge.from).or_default().push(index);
        self.incoming.entry(edge.to).or_default().push(index);
        self.edges.push(edge);
        Ok(())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    pub fn edges_to(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.incoming
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    pub fn edges_from_kind(&self, id: NodeId, kind: EdgeKind) -> impl Iterator<Item = &Edge> {
        self.edges_from(id).filter(move |e| e.kind == kind)
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId, kind: EdgeKind) -> bool {
        self.edges_from(from)
            .any(|e| e.to == to && e.kind == kind)
    }

    // ─── AST structure ───────────────────────────────────────────────────

    pub fn ast_children(&self, id: NodeId) -> Vec<NodeId> {
        self.edges_from_kind(id, EdgeKind::Ast)
            .map(|e| e.to)
            .collect()
    }

    pub fn ast_parent(&self, id: NodeId) -> Option<NodeId> {
        self.edges_to(id)
            .find(|e| e.kind == EdgeKind::Ast)
            .map(|e| e.from)
    }

    // ─── units, types, scopes ────────────────────────────────────────────

    pub fn add_translation_unit(&mut self, id: NodeId) -> Result<()> {
        match self.nodes.get(&id) {
            Some(node) if node.kind == NodeKind::TranslationUnit => {
                self.translation_units.push(id);
                Ok(())
            }
            Some(node) => Err(CoreError::invalid_edge(format!(
                "{} node {} registered as translation unit",
                node.kind.label(),
                id
            ))),
            None => Err(CoreError::UnknownNode(id)),
        }
    }

    pub fn translation_units(&self) -> &[NodeId] {
        &self.translation_units
    }

    /// Merges a canonical type node produced by the type manager.
    pub fn add_type_node(&mut self, node: Node) -> Result<NodeId> {
        let id = self.add_node(node)?;
        self.type_nodes.push(id);
        Ok(id)
    }

    pub fn type_nodes(&self) -> &[NodeId] {
        &self.type_nodes
    }

    pub fn set_root_scope(&mut self, scope: ScopeId) {
        self.root_scope = Some(scope);
    }

    pub fn root_scope(&self) -> Option<ScopeId> {
        self.root_scope
    }

    // ─── diagnostics and status ──────────────────────────────────────────

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn set_status(&mut self, status: TranslationStatus) {
        self.status = status;
    }

    pub fn status(&self) -> TranslationStatus {
        self.status
    }

    pub fn was_cancelled(&self) -> bool {
        self.status == TranslationStatus::Cancelled
    }
}

impl Default for TranslationResult {
    fn default() -> Self {
        Self::new()
    }
}
