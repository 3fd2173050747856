//! Import resolution: `Imports` edges from import declarations to the
//! unit or namespace they name.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{Diagnostic, Edge, EdgeKind, NodeId, NodeKind, TranslationResult};
use rustc_hash::FxHashMap;
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "import-resolver",
    hard_deps: &["type-hierarchy-resolver"],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: false,
};

pub struct ImportResolver;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(ImportResolver))
}

impl Pass for ImportResolver {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        // Units and namespaces are the importable targets.
        let mut targets: FxHashMap<&str, NodeId> = FxHashMap::default();
        for node in result.nodes() {
            if matches!(node.kind, NodeKind::TranslationUnit | NodeKind::NamespaceDecl) {
                targets.entry(node.name.as_str()).or_insert(node.id);
            }
        }

        let mut delta = GraphDelta::default();
        for node in result.nodes() {
            let NodeKind::ImportDecl { source } = &node.kind else {
                continue;
            };
            match targets.get(source.as_str()) {
                Some(&target) => {
                    delta.edges.push(Edge::new(node.id, target, EdgeKind::Imports));
                }
                None => {
                    let mut diagnostic = Diagnostic::warning(
                        DESCRIPTOR.name,
                        format!("unresolved import '{source}'"),
                    );
                    if let Some(location) = &node.location {
                        diagnostic = diagnostic.with_location(location.clone());
                    }
                    delta.diagnostics.push(diagnostic);
                }
            }
        }
        Ok(delta)
    }
}
