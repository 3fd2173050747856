#![allow(dead_code)]
//! Shared test fixtures: a small line-oriented language and its frontend.
//!
//! The grammar is just enough to exercise the pipeline end to end:
//!
//! ```text
//! record Derived : Base
//! import util
//! func main
//!   var x int
//!   set x = 1
//!   use x
//!   call helper
//!   return
//! end
//! ```

use cpgraph_translation::{
    Edge, EdgeKind, Language, LanguageFrontend, Node, NodeId, NodeKind, ScopeId, ScopeKind,
    SourceLocation, Span, Subgraph, TranslationContext, TranslationError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ToyFrontend;

struct UnitBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    code_in_nodes: bool,
}

impl UnitBuilder {
    fn add(&mut self, mut node: Node, parent: NodeId, index: u32, line: &str) -> NodeId {
        if self.code_in_nodes {
            node = node.with_code(line);
        }
        let id = node.id;
        self.nodes.push(node);
        self.edges
            .push(Edge::new(parent, id, EdgeKind::Ast).with_index(index));
        id
    }
}

impl LanguageFrontend for ToyFrontend {
    fn parse(
        &mut self,
        file: &Path,
        ctx: &TranslationContext,
    ) -> cpgraph_translation::Result<Subgraph> {
        let source =
            std::fs::read_to_string(file).map_err(|e| TranslationError::parse(file, e))?;
        let alloc = &ctx.node_ids;
        let scopes = &ctx.scope_manager;
        let global = scopes.global_scope();

        let unit = alloc.next_id();
        let mut builder = UnitBuilder {
            nodes: vec![Node::new(unit, NodeKind::TranslationUnit, file.display().to_string())
                .with_language("toy")
                .with_location(SourceLocation::file_only(file))],
            edges: Vec::new(),
            code_in_nodes: ctx.config.code_in_nodes,
        };

        // (block, scope, next child index) of the open function body.
        let mut body: Option<(NodeId, ScopeId, u32)> = None;
        let mut unit_children = 0u32;

        for (number, raw) in source.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let location = SourceLocation::new(
                file,
                Span::new(number as u32 + 1, 0, number as u32 + 1, raw.len() as u32),
            );
            let words: Vec<&str> = line.split_whitespace().collect();
            let keyword = words[0];

            let open_scope: Option<ScopeId> = body.as_ref().map(|&(_, scope, _)| scope);
            let fail = |message: String| -> cpgraph_translation::Result<Subgraph> {
                // Leave the half-open scope so the worker thread's stack
                // stays balanced for the next file.
                if let Some(scope) = open_scope {
                    let _ = scopes.leave_scope(scope);
                }
                Err(TranslationError::parse(
                    file,
                    format!("line {}: {}", number + 1, message),
                ))
            };

            match keyword {
                "record" | "import" | "func" if body.is_some() => {
                    return fail(format!("'{keyword}' inside a function"));
                }
                "record" => {
                    let Some(&name) = words.get(1) else {
                        return fail("record needs a name".into());
                    };
                    let superclasses = if words.get(2) == Some(&":") {
                        words[3..].iter().map(|s| s.to_string()).collect()
                    } else {
                        Vec::new()
                    };
                    let node =
                        Node::new(alloc.next_id(), NodeKind::RecordDecl { superclasses }, name)
                            .with_language("toy")
                            .with_location(location)
                            .in_scope(global);
                    let id = builder.add(node, unit, unit_children, line);
                    unit_children += 1;
                    scopes.declare(global, name, id);
                }
                "import" => {
                    let Some(&target) = words.get(1) else {
                        return fail("import needs a target".into());
                    };
                    let node = Node::new(
                        alloc.next_id(),
                        NodeKind::ImportDecl {
                            source: target.to_string(),
                        },
                        target,
                    )
                    .with_language("toy")
                    .with_location(location)
                    .in_scope(global);
                    builder.add(node, unit, unit_children, line);
                    unit_children += 1;
                }
                "func" => {
                    let Some(&name) = words.get(1) else {
                        return fail("func needs a name".into());
                    };
                    let func = Node::new(alloc.next_id(), NodeKind::FunctionDecl, name)
                        .with_language("toy")
                        .with_location(location)
                        .in_scope(global);
                    let func_id = builder.add(func, unit, unit_children, line);
                    unit_children += 1;
                    scopes.declare(global, name, func_id);

                    let scope = scopes.new_scope(ScopeKind::Function, func_id);
                    scopes.enter_scope(scope).map_err(TranslationError::from)?;

                    let block = Node::new(alloc.next_id(), NodeKind::Block, "")
                        .with_language("toy")
                        .in_scope(scope);
                    let block_id = builder.add(block, func_id, 0, line);
                    body = Some((block_id, scope, 0));
                }
                "end" => match body.take() {
                    Some((_, scope, _)) => {
                        scopes.leave_scope(scope).map_err(TranslationError::from)?;
                    }
                    None => return fail("'end' without a function".into()),
                },
                "var" | "set" | "use" | "call" | "return" => {
                    let Some((block, scope, index)) = body.as_mut() else {
                        return fail(format!("'{keyword}' outside a function"));
                    };
                    let block = *block;
                    let scope = *scope;
                    let child = *index;
                    *index += 1;

                    match keyword {
                        "var" => {
                            let Some(&name) = words.get(1) else {
                                return fail("var needs a name".into());
                            };
                            let node = Node::new(
                                alloc.next_id(),
                                NodeKind::VariableDecl {
                                    type_name: words.get(2).map(|s| s.to_string()),
                                },
                                name,
                            )
                            .with_language("toy")
                            .with_location(location)
                            .in_scope(scope);
                            let id = builder.add(node, block, child, line);
                            scopes.declare(scope, name, id);
                        }
                        "set" => {
                            let (name, value) = match (words.get(1), words.get(2), words.get(3)) {
                                (Some(&name), Some(&"="), Some(&value)) => (name, value),
                                _ => return fail("set needs 'name = value'".into()),
                            };
                            let assign = Node::new(alloc.next_id(), NodeKind::AssignExpr, "")
                                .with_language("toy")
                                .with_location(location.clone())
                                .in_scope(scope);
                            let assign_id = builder.add(assign, block, child, line);

                            let target = Node::new(alloc.next_id(), NodeKind::Reference, name)
                                .with_language("toy")
                                .with_location(location.clone())
                                .in_scope(scope);
                            builder.add(target, assign_id, 0, line);

                            let value_node = if value.chars().all(|c| c.is_ascii_digit()) {
                                Node::new(
                                    alloc.next_id(),
                                    NodeKind::Literal {
                                        value: value.to_string(),
                                    },
                                    value,
                                )
                            } else {
                                Node::new(alloc.next_id(), NodeKind::Reference, value)
                            }
                            .with_language("toy")
                            .with_location(location)
                            .in_scope(scope);
                            builder.add(value_node, assign_id, 1, line);
                        }
                        "use" => {
                            let Some(&name) = words.get(1) else {
                                return fail("use needs a name".into());
                            };
                            let node = Node::new(alloc.next_id(), NodeKind::Reference, name)
                                .with_language("toy")
                                .with_location(location)
                                .in_scope(scope);
                            builder.add(node, block, child, line);
                        }
                        "call" => {
                            let Some(&name) = words.get(1) else {
                                return fail("call needs a name".into());
                            };
                            let node = Node::new(alloc.next_id(), NodeKind::CallExpr, name)
                                .with_language("toy")
                                .with_location(location)
                                .in_scope(scope);
                            builder.add(node, block, child, line);
                        }
                        _ => {
                            let node = Node::new(alloc.next_id(), NodeKind::ReturnStmt, "")
                                .with_language("toy")
                                .with_location(location)
                                .in_scope(scope);
                            builder.add(node, block, child, line);
                        }
                    }
                }
                _ => {
                    return fail(format!("unknown directive '{keyword}'"));
                }
            }
        }

        if let Some((_, scope, _)) = body {
            let _ = scopes.leave_scope(scope);
            return Err(TranslationError::parse(file, "unterminated function"));
        }

        Ok(Subgraph {
            unit,
            nodes: builder.nodes,
            edges: builder.edges,
        })
    }
}

pub fn toy_language() -> Language {
    Language::new(
        "toy",
        ["toy"],
        Arc::new(|| Box::new(ToyFrontend) as Box<dyn LanguageFrontend>),
    )
    .with_builtin_types(["int", "string"])
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}
