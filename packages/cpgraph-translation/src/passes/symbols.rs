//! Symbol resolution: references to their declarations, calls to their
//! targets. Unresolved names trigger inference when enabled; inference is
//! the only node-appending pass and runs as a single writer.

use crate::pass::{GraphDelta, Pass, PassContext, PassDescriptor, PassRegistration};
use cpgraph_core::{
    Diagnostic, Edge, EdgeKind, Node, NodeId, NodeKind, TranslationResult, TypeDescriptor,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

static DESCRIPTOR: PassDescriptor = PassDescriptor {
    name: "symbol-resolver",
    hard_deps: &["import-resolver"],
    soft_deps: &[],
    execute_before: &[],
    first: false,
    last: false,
    parallel_safe: false,
};

pub struct SymbolResolver;

pub(crate) fn registration() -> PassRegistration {
    PassRegistration::new(&DESCRIPTOR, || Arc::new(SymbolResolver))
}

impl SymbolResolver {
    /// Fabricates a declaration for an unresolved name and makes it
    /// visible through the global scope. The new node is parented under
    /// the first translation unit so the AST stays single-rooted.
    fn infer(
        &self,
        kind: NodeKind,
        name: &str,
        language: Option<&String>,
        result: &TranslationResult,
        ctx: &PassContext<'_>,
        delta: &mut GraphDelta,
    ) -> NodeId {
        let translation = ctx.translation;
        let id = translation.node_ids.next_id();
        let mut node = Node::new(id, kind, name).mark_inferred();
        node.language = language.cloned();
        node.scope = Some(translation.scope_manager.global_scope());
        translation
            .scope_manager
            .declare(translation.scope_manager.global_scope(), name, id);
        delta.nodes.push(node);
        if let Some(&unit) = result.translation_units().first() {
            delta.edges.push(Edge::new(unit, id, EdgeKind::Ast));
        }
        delta.diagnostics.push(Diagnostic::info(
            DESCRIPTOR.name,
            format!("inferred declaration for '{name}'"),
        ));
        id
    }

    /// Guesses an inferred function's return type from an assignment it
    /// feeds, when the target's declared type is known.
    fn guess_return_type(
        &self,
        call: NodeId,
        result: &TranslationResult,
        ctx: &PassContext<'_>,
    ) -> Option<NodeId> {
        let parent = result.ast_parent(call)?;
        let parent_node = result.node(parent)?;
        if parent_node.kind != NodeKind::AssignExpr {
            return None;
        }
        let target = result.ast_children(parent).into_iter().next()?;
        if target == call {
            return None;
        }
        let target_node = result.node(target)?;
        let scope = target_node
            .scope
            .unwrap_or_else(|| ctx.translation.scope_manager.global_scope());
        let decl = ctx.translation.scope_manager.resolve(&target_node.name, scope)?;
        let NodeKind::VariableDecl { type_name: Some(type_name) } = &result.node(decl)?.kind
        else {
            return None;
        };
        Some(ctx.translation.type_manager.register_type(
            &TypeDescriptor::plain(type_name.as_str()),
            &ctx.translation.node_ids,
        ))
    }
}

impl Pass for SymbolResolver {
    fn descriptor(&self) -> &'static PassDescriptor {
        &DESCRIPTOR
    }

    fn accept(
        &self,
        result: &TranslationResult,
        ctx: &PassContext<'_>,
    ) -> crate::error::Result<GraphDelta> {
        let translation = ctx.translation;
        let inference = translation.config.inference;
        let global = translation.scope_manager.global_scope();

        // Cross-unit function index; lazy symbol resolution happens here,
        // after all units were merged.
        let mut functions: FxHashMap<&str, Vec<NodeId>> = FxHashMap::default();
        for node in result.nodes() {
            if node.kind == NodeKind::FunctionDecl {
                functions.entry(node.name.as_str()).or_default().push(node.id);
            }
        }

        let mut delta = GraphDelta::default();

        for node in result.nodes() {
            match &node.kind {
                NodeKind::Reference => {
                    let scope = node.scope.unwrap_or(global);
                    if let Some(decl) = translation.scope_manager.resolve(&node.name, scope) {
                        delta.edges.push(Edge::new(node.id, decl, EdgeKind::RefersTo));
                    } else if inference.infer_variables {
                        let inferred = self.infer(
                            NodeKind::VariableDecl { type_name: None },
                            &node.name,
                            node.language.as_ref(),
                            result,
                            ctx,
                            &mut delta,
                        );
                        delta
                            .edges
                            .push(Edge::new(node.id, inferred, EdgeKind::RefersTo));
                    } else {
                        let mut diagnostic = Diagnostic::warning(
                            DESCRIPTOR.name,
                            format!("could not resolve reference '{}'", node.name),
                        );
                        if let Some(location) = &node.location {
                            diagnostic = diagnostic.with_location(location.clone());
                        }
                        delta.diagnostics.push(diagnostic);
                    }
                }
                NodeKind::CallExpr => {
                    let scope = node.scope.unwrap_or(global);
                    let scoped = translation
                        .scope_manager
                        .resolve(&node.name, scope)
                        .filter(|id| {
                            result.node(*id).map_or(
                                // Declared during this run by inference.
                                true,
                                |n| n.kind == NodeKind::FunctionDecl,
                            )
                        });

                    if let Some(target) = scoped {
                        delta
                            .edges
                            .push(Edge::new(node.id, target, EdgeKind::Invokes));
                    } else if let Some(targets) = functions.get(node.name.as_str()) {
                        for &target in targets {
                            delta
                                .edges
                                .push(Edge::new(node.id, target, EdgeKind::Invokes));
                        }
                    } else if inference.infer_functions {
                        let inferred = self.infer(
                            NodeKind::FunctionDecl,
                            &node.name,
                            node.language.as_ref(),
                            result,
                            ctx,
                            &mut delta,
                        );
                        delta
                            .edges
                            .push(Edge::new(node.id, inferred, EdgeKind::Invokes));
                        if inference.infer_return_types {
                            if let Some(type_node) = self.guess_return_type(node.id, result, ctx) {
                                delta
                                    .edges
                                    .push(Edge::new(inferred, type_node, EdgeKind::TypeUsage));
                            }
                        }
                    } else {
                        let mut diagnostic = Diagnostic::warning(
                            DESCRIPTOR.name,
                            format!("could not resolve call target '{}'", node.name),
                        );
                        if let Some(location) = &node.location {
                            diagnostic = diagnostic.with_location(location.clone());
                        }
                        delta.diagnostics.push(diagnostic);
                    }
                }
                _ => {}
            }
        }

        // Types registered while guessing return types must enter the
        // arena with this barrier.
        delta.nodes.extend(translation.type_manager.take_nodes());
        Ok(delta)
    }
}
