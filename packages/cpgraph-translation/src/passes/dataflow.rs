//! Data-flow graph construction.
//!
//! `DataFlowPass` adds the flow-insensitive base: assignment value to
//! assignment target, declaration to use. `ControlFlowSensitiveDfg`
//! refines it along the evaluation order, wiring the last write of a
//! declaration to each later read.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{Edge, EdgeKind, NodeId, NodeKind, TranslationResult};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "data-flow-graph",
    hard_deps: &["symbol-resolver"],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: true,
};

static CFS_DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "control-flow-sensitive-dfg",
    hard_deps: &["evaluation-order-graph", "data-flow-graph"],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: false,
};

pub struct DataFlowPass;

pub struct ControlFlowSensitiveDfg;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(DataFlowPass))
}

pub(crate) fn cfs_registration() -> PassRegistration {
    PassRegistration::new(&CFS_DESCRIPTOR, || Arc::new(ControlFlowSensitiveDfg))
}

/// The declaration a reference resolves to, if any.
fn referent(result: &TranslationResult, reference: NodeId) -> Option<NodeId> {
    result
        .edges_from_kind(reference, EdgeKind::RefersTo)
        .map(|e| e.to)
        .next()
}

/// Whether `reference` is the written side of an assignment.
fn is_assignment_target(result: &TranslationResult, reference: NodeId) -> bool {
    result.ast_parent(reference).is_some_and(|parent| {
        result.node(parent).map(|n| &n.kind) == Some(&NodeKind::AssignExpr)
            && result.ast_children(parent).first() == Some(&reference)
    })
}

impl Pass for DataFlowPass {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let mut delta = GraphDelta::default();

        for node in result.nodes() {
            match node.kind {
                NodeKind::AssignExpr => {
                    let children = result.ast_children(node.id);
                    if let [target, value] = children[..] {
                        delta.edges.push(Edge::new(value, target, EdgeKind::Dfg));
                    }
                }
                NodeKind::Reference => {
                    // Reads flow from their declaration; writes are covered
                    // by the assignment edge above. Only value declarations
                    // carry data flow; a reference naming a function or
                    // record gets no edge.
                    if is_assignment_target(result, node.id) {
                        continue;
                    }
                    if let Some(decl) = referent(result, node.id) {
                        if result.node(decl).is_some_and(|n| {
                            matches!(
                                n.kind,
                                NodeKind::VariableDecl { .. } | NodeKind::ParameterDecl { .. }
                            )
                        }) {
                            delta.edges.push(Edge::new(decl, node.id, EdgeKind::Dfg));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(delta)
    }
}

impl Pass for ControlFlowSensitiveDfg {
    fn descriptor(&self) -> &'static PassDescriptor {
        &CFS_DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let mut delta = GraphDelta::default();

        for function in result.nodes().filter(|n| n.kind == NodeKind::FunctionDecl) {
            // Walk the EOG chain, tracking the last write per declaration.
            let mut last_write: FxHashMap<NodeId, NodeId> = FxHashMap::default();
            let mut visited: FxHashSet<NodeId> = FxHashSet::default();
            let mut cursor = next_in_order(result, function.id);

            while let Some(current) = cursor {
                if !visited.insert(current) {
                    break;
                }
                let Some(node) = result.node(current) else {
                    break;
                };

                match node.kind {
                    NodeKind::AssignExpr => {
                        let children = result.ast_children(current);
                        if let [target, value] = children[..] {
                            if let Some(decl) = referent(result, target) {
                                last_write.insert(decl, value);
                            }
                        }
                    }
                    NodeKind::Reference if !is_assignment_target(result, current) => {
                        if let Some(decl) = referent(result, current) {
                            if let Some(&write) = last_write.get(&decl) {
                                delta.edges.push(Edge::new(write, current, EdgeKind::Dfg));
                            }
                        }
                    }
                    _ => {}
                }

                cursor = next_in_order(result, current);
            }
        }
        Ok(delta)
    }
}

fn next_in_order(result: &TranslationResult, id: NodeId) -> Option<NodeId> {
    result.edges_from_kind(id, EdgeKind::Eog).map(|e| e.to).next()
}
