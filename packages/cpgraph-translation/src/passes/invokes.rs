//! Dynamic invoke resolution: calls the symbol resolver left without a
//! static target get name-matched candidate edges, marked dynamic.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{Edge, EdgeKind, NodeId, NodeKind, TranslationResult};
use rustc_hash::FxHashMap;
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "dynamic-invoke-resolver",
    hard_deps: &["symbol-resolver"],
    soft_deps: &["data-flow-graph"],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: true,
};

pub struct DynamicInvokeResolver;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(DynamicInvokeResolver))
}

impl Pass for DynamicInvokeResolver {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        // Candidate index keyed by the unqualified function name.
        let mut candidates: FxHashMap<&str, Vec<NodeId>> = FxHashMap::default();
        for node in result.nodes() {
            if node.kind == NodeKind::FunctionDecl {
                let simple = node.name.rsplit(['.', ':']).next().unwrap_or(&node.name);
                candidates.entry(simple).or_default().push(node.id);
            }
        }

        let mut delta = GraphDelta::default();
        for node in result.nodes() {
            if node.kind != NodeKind::CallExpr {
                continue;
            }
            if result
                .edges_from_kind(node.id, EdgeKind::Invokes)
                .next()
                .is_some()
            {
                continue;
            }
            let simple = node.name.rsplit(['.', ':']).next().unwrap_or(&node.name);
            if let Some(targets) = candidates.get(simple) {
                for &target in targets {
                    delta
                        .edges
                        .push(Edge::new(node.id, target, EdgeKind::Invokes).dynamic());
                }
            }
        }
        Ok(delta)
    }
}
