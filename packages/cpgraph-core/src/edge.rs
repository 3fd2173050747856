//! Labeled directed edges between nodes.
//!
//! Edges are non-owning: both endpoints are identities into the result
//! arena, which keeps the cyclic AST/EOG/DFG graphs free of ownership
//! cycles.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Edge label taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// AST containment, parent to child.
    Ast,
    /// Evaluation order.
    Eog,
    /// Data flow, value source to value sink.
    Dfg,
    /// Call to callee declaration.
    Invokes,
    /// Declaration to its canonical type node.
    TypeUsage,
    /// Subtype to supertype.
    Extends,
    /// Reference to the declaration it names.
    RefersTo,
    /// Import declaration to the imported unit or namespace.
    Imports,
    /// Translation unit to an included unit.
    Includes,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Ast => "AST",
            EdgeKind::Eog => "EOG",
            EdgeKind::Dfg => "DFG",
            EdgeKind::Invokes => "INVOKES",
            EdgeKind::TypeUsage => "TYPE_USAGE",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::RefersTo => "REFERS_TO",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Includes => "INCLUDES",
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional edge payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeProperties {
    /// Argument position for call argument edges.
    pub index: Option<u32>,
    /// Branch condition value for EOG edges out of a conditional.
    pub branch: Option<bool>,
    /// Set on invocation edges resolved dynamically rather than statically.
    pub dynamic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub properties: EdgeProperties,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, kind: EdgeKind) -> Self {
        Self {
            from,
            to,
            kind,
            properties: EdgeProperties::default(),
        }
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.properties.index = Some(index);
        self
    }

    pub fn with_branch(mut self, branch: bool) -> Self {
        self.properties.branch = Some(branch);
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.properties.dynamic = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_builder() {
        let e = Edge::new(NodeId(1), NodeId(2), EdgeKind::Invokes).dynamic();
        assert!(e.properties.dynamic);
        assert_eq!(e.properties.index, None);

        let arg = Edge::new(NodeId(3), NodeId(4), EdgeKind::Ast).with_index(2);
        assert_eq!(arg.properties.index, Some(2));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(EdgeKind::Eog.as_str(), "EOG");
        assert_eq!(EdgeKind::RefersTo.to_string(), "REFERS_TO");
    }
}
