//! Type resolution: interns declared type names through the type manager
//! and links declarations to their canonical type nodes. Unknown type
//! names become inferred records when enabled.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{Edge, EdgeKind, Node, NodeKind, TranslationResult, TypeDescriptor};
use rustc_hash::FxHashSet;
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "type-resolver",
    hard_deps: &["symbol-resolver"],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: true,
};

pub struct TypeResolver;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(TypeResolver))
}

impl Pass for TypeResolver {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let translation = ctx.translation;
        let known_records: FxHashSet<&str> = result
            .nodes()
            .filter(|n| matches!(n.kind, NodeKind::RecordDecl { .. }))
            .map(|n| n.name.as_str())
            .collect();
        let builtins: FxHashSet<&str> = translation
            .config
            .languages
            .languages()
            .iter()
            .flat_map(|l| l.builtin_types.iter().map(String::as_str))
            .collect();

        let mut delta = GraphDelta::default();
        let mut inferred_records: FxHashSet<String> = FxHashSet::default();

        for node in result.nodes() {
            let type_name = match &node.kind {
                NodeKind::VariableDecl { type_name: Some(t) } => t,
                NodeKind::ParameterDecl { type_name: Some(t) } => t,
                _ => continue,
            };

            let descriptor = TypeDescriptor::plain(type_name.as_str());
            let type_node = translation
                .type_manager
                .register_type(&descriptor, &translation.node_ids);
            delta
                .edges
                .push(Edge::new(node.id, type_node, EdgeKind::TypeUsage));

            // A named type that is neither built in nor declared anywhere
            // gets an inferred record to hang analysis off.
            let base = type_name.trim_start_matches('*');
            if translation.config.inference.infer_records
                && !builtins.contains(base)
                && !known_records.contains(base)
                && inferred_records.insert(base.to_string())
            {
                let id = translation.node_ids.next_id();
                delta.nodes.push(
                    Node::new(
                        id,
                        NodeKind::RecordDecl { superclasses: vec![] },
                        base,
                    )
                    .mark_inferred(),
                );
                if let Some(&unit) = result.translation_units().first() {
                    delta.edges.push(Edge::new(unit, id, EdgeKind::Ast));
                }
                translation.scope_manager.declare(
                    translation.scope_manager.global_scope(),
                    base,
                    id,
                );
            }
        }

        // Canonical type nodes created above enter the arena with this
        // barrier.
        delta.nodes.extend(translation.type_manager.take_nodes());
        Ok(delta)
    }
}
