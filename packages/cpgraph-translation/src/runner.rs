//! Pass runner: executes the scheduled group list against the graph.
//!
//! Groups run strictly in order. Within a group, passes marked
//! parallel-safe run concurrently when `use_parallel_passes` is set; the
//! rest run serially after the concurrent subset joins. Every pass
//! computes a delta against the shared view; deltas are applied at the
//! barrier in registration order, so passes of one group stay commutative
//! on graph state and re-running a settled schedule changes nothing.

use crate::context::{PhaseOutcome, TranslationContext};
use crate::error::Result;
use crate::pass::{GraphDelta, Pass, PassContext};
use cpgraph_core::TranslationResult;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

pub struct PassRunner<'a> {
    ctx: &'a TranslationContext,
}

impl<'a> PassRunner<'a> {
    pub fn new(ctx: &'a TranslationContext) -> Self {
        Self { ctx }
    }

    pub fn run(&self, result: &mut TranslationResult) -> Result<PhaseOutcome> {
        let config = &*self.ctx.config;
        let groups = config.pass_groups();

        for (index, group) in groups.iter().enumerate() {
            // Cooperative cancellation between groups.
            if self.ctx.is_cancelled() {
                return Ok(PhaseOutcome::Cancelled);
            }

            info!(
                run = %self.ctx.run_id(),
                group = index + 1,
                of = groups.len(),
                passes = group.len(),
                "executing pass group"
            );

            if config.use_parallel_passes && group.len() > 1 {
                self.run_group_parallel(group, result)?;
            } else {
                for pass in group {
                    // Cooperative cancellation between passes.
                    if self.ctx.is_cancelled() {
                        return Ok(PhaseOutcome::Cancelled);
                    }
                    let delta = self.run_pass(pass.as_ref(), result)?;
                    apply_deltas(result, vec![delta])?;
                }
            }
        }

        if self.ctx.is_cancelled() {
            Ok(PhaseOutcome::Cancelled)
        } else {
            Ok(PhaseOutcome::Completed)
        }
    }

    /// Concurrent subset first (join-all barrier, deltas applied in
    /// registration order), then the passes that did not opt into
    /// parallelism.
    fn run_group_parallel(
        &self,
        group: &[Arc<dyn Pass>],
        result: &mut TranslationResult,
    ) -> Result<()> {
        let (parallel, serial): (Vec<_>, Vec<_>) = group
            .iter()
            .partition(|pass| pass.descriptor().parallel_safe);

        if !parallel.is_empty() {
            let view: &TranslationResult = result;
            let deltas: Vec<Result<GraphDelta>> = parallel
                .par_iter()
                .map(|pass| self.accept_on(pass.as_ref(), view))
                .collect();
            let deltas = deltas.into_iter().collect::<Result<Vec<_>>>()?;
            apply_deltas(result, deltas)?;
        }

        for pass in serial {
            if self.ctx.is_cancelled() {
                return Ok(());
            }
            let delta = self.run_pass(pass.as_ref(), result)?;
            apply_deltas(result, vec![delta])?;
        }
        Ok(())
    }

    fn run_pass(&self, pass: &dyn Pass, result: &TranslationResult) -> Result<GraphDelta> {
        self.accept_on(pass, result)
    }

    fn accept_on(&self, pass: &dyn Pass, view: &TranslationResult) -> Result<GraphDelta> {
        let name = pass.descriptor().name;
        let start = Instant::now();
        let ctx = PassContext {
            translation: self.ctx,
            config: self.ctx.config.pass_config(name),
        };
        let delta = pass.accept(view, &ctx)?;
        debug!(
            pass = name,
            new_edges = delta.edges.len(),
            new_nodes = delta.nodes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "pass completed"
        );
        Ok(delta)
    }
}

/// Applies a barrier's worth of deltas: all nodes first (so cross-delta
/// edges always find their endpoints), then renames, then edges with
/// already-present edges skipped, then diagnostics.
pub(crate) fn apply_deltas(
    result: &mut TranslationResult,
    deltas: Vec<GraphDelta>,
) -> Result<()> {
    for delta in &deltas {
        for node in &delta.nodes {
            if result.node(node.id).is_none() {
                result.add_node(node.clone())?;
            }
        }
    }
    for delta in deltas {
        for (id, name) in delta.renames {
            if let Some(node) = result.node_mut(id) {
                node.name = name;
            }
        }
        for edge in delta.edges {
            let present = result
                .edges_from(edge.from)
                .any(|e| e.to == edge.to && e.kind == edge.kind && e.properties == edge.properties);
            if !present {
                result.add_edge(edge)?;
            }
        }
        for diagnostic in delta.diagnostics {
            result.add_diagnostic(diagnostic);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpgraph_core::{Edge, EdgeKind, Node, NodeIdAllocator, NodeKind};

    #[test]
    fn test_apply_deltas_is_idempotent_on_edges() {
        let alloc = NodeIdAllocator::new();
        let mut result = TranslationResult::new();
        let tu = result
            .add_node(Node::new(alloc.next_id(), NodeKind::TranslationUnit, "a.c"))
            .unwrap();
        let f = result
            .add_node(Node::new(alloc.next_id(), NodeKind::FunctionDecl, "f"))
            .unwrap();

        let delta = || GraphDelta {
            edges: vec![Edge::new(tu, f, EdgeKind::Ast)],
            ..GraphDelta::default()
        };

        apply_deltas(&mut result, vec![delta()]).unwrap();
        apply_deltas(&mut result, vec![delta()]).unwrap();
        assert_eq!(result.edge_count(), 1);
    }

    #[test]
    fn test_apply_deltas_adds_nodes_before_edges() {
        let alloc = NodeIdAllocator::new();
        let mut result = TranslationResult::new();
        let call = result
            .add_node(Node::new(alloc.next_id(), NodeKind::CallExpr, "g"))
            .unwrap();

        // The edge target only exists inside the delta.
        let inferred = Node::new(alloc.next_id(), NodeKind::FunctionDecl, "g").mark_inferred();
        let inferred_id = inferred.id;
        let delta = GraphDelta {
            nodes: vec![inferred],
            edges: vec![Edge::new(call, inferred_id, EdgeKind::Invokes)],
            ..GraphDelta::default()
        };

        apply_deltas(&mut result, vec![delta]).unwrap();
        assert!(result.node(inferred_id).unwrap().inferred);
        assert!(result.has_edge(call, inferred_id, EdgeKind::Invokes));
    }
}
