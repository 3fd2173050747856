//! Evaluation-order graph: threads each function's statement sequence
//! with EOG edges, entry at the function node itself.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{Edge, EdgeKind, NodeKind, TranslationResult};
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "evaluation-order-graph",
    hard_deps: &["symbol-resolver"],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: true,
};

pub struct EvaluationOrderPass;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(EvaluationOrderPass))
}

impl Pass for EvaluationOrderPass {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let mut delta = GraphDelta::default();

        for function in result.nodes().filter(|n| n.kind == NodeKind::FunctionDecl) {
            let Some(body) = result
                .ast_children(function.id)
                .into_iter()
                .find(|&child| result.node(child).map(|n| &n.kind) == Some(&NodeKind::Block))
            else {
                continue;
            };

            let mut previous = function.id;
            for statement in result.ast_children(body) {
                delta
                    .edges
                    .push(Edge::new(previous, statement, EdgeKind::Eog));
                previous = statement;
            }
        }
        Ok(delta)
    }
}
