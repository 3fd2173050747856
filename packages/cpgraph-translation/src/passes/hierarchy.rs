//! Type hierarchy resolution: `Extends` edges from record superclass
//! names. Runs first so every later resolver sees the hierarchy.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{Diagnostic, Edge, EdgeKind, NodeId, NodeKind, TranslationResult};
use rustc_hash::FxHashMap;
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "type-hierarchy-resolver",
    hard_deps: &[],
    soft_deps: &[],
    execute_before: &[],
    first: true,
    last: false,
    parallel_safe: false,
};

pub struct TypeHierarchyResolver;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(TypeHierarchyResolver))
}

impl Pass for TypeHierarchyResolver {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let mut records: FxHashMap<&str, NodeId> = FxHashMap::default();
        for node in result.nodes() {
            if matches!(node.kind, NodeKind::RecordDecl { .. }) {
                records.entry(node.name.as_str()).or_insert(node.id);
            }
        }

        let mut delta = GraphDelta::default();
        for node in result.nodes() {
            let NodeKind::RecordDecl { superclasses } = &node.kind else {
                continue;
            };
            for superclass in superclasses {
                match records.get(superclass.as_str()) {
                    Some(&target) if target != node.id => {
                        delta.edges.push(Edge::new(node.id, target, EdgeKind::Extends));
                    }
                    Some(_) => {}
                    None => {
                        let mut diagnostic = Diagnostic::warning(
                            DESCRIPTOR.name,
                            format!("unknown supertype '{superclass}' of '{}'", node.name),
                        );
                        if let Some(location) = &node.location {
                            diagnostic = diagnostic.with_location(location.clone());
                        }
                        delta.diagnostics.push(diagnostic);
                    }
                }
            }
        }
        Ok(delta)
    }
}
