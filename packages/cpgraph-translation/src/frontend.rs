//! Frontend contract and the frontend runner.
//!
//! A frontend is a black box turning one file into a subgraph rooted at a
//! `TranslationUnit` node. The runner expands components to file lists,
//! partitions them by language, drives frontends serially or across the
//! rayon pool, and merges the subgraphs into the result in a deterministic
//! order derived from the input file list rather than completion order.

use crate::context::{PhaseOutcome, TranslationContext};
use crate::error::{Result, TranslationError};
use crate::language::Language;
use cpgraph_core::{Diagnostic, Edge, Node, NodeId, SourceLocation, TranslationResult};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Partial graph produced by parsing one file (or one unity group).
pub struct Subgraph {
    /// The `TranslationUnit` node; must be present in `nodes`.
    pub unit: NodeId,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Language-specific parser. Implementations allocate node identities from
/// the shared context allocator so identities survive the merge unchanged.
pub trait LanguageFrontend: Send {
    /// Parses one file into a subgraph, failing with a parse error that the
    /// runner records as a diagnostic (or propagates under
    /// `fail_on_error`).
    fn parse(&mut self, file: &Path, ctx: &TranslationContext) -> Result<Subgraph>;

    /// Invoked once at the end of this frontend's work.
    fn cleanup(&mut self) {}
}

/// One unit of parsing work: a single file, or a component's unity group.
struct ParseItem {
    component: String,
    language: Language,
    files: Vec<PathBuf>,
}

pub struct FrontendRunner<'a> {
    ctx: &'a TranslationContext,
}

impl<'a> FrontendRunner<'a> {
    pub fn new(ctx: &'a TranslationContext) -> Self {
        Self { ctx }
    }

    pub fn run(&self, result: &mut TranslationResult) -> Result<PhaseOutcome> {
        let items = self.collect_items()?;
        info!(
            run = %self.ctx.run_id(),
            items = items.len(),
            parallel = self.ctx.config.use_parallel_frontends,
            "parsing sources"
        );

        let outcomes: Vec<Result<Option<Subgraph>>> = if self.ctx.config.use_parallel_frontends {
            // Dedicated pool sized by the configuration; all workers share
            // the one translation context.
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.ctx.config.parallel_workers)
                .build()
                .map_err(|e| TranslationError::internal(format!("worker pool: {e}")))?;
            pool.install(|| items.par_iter().map(|item| self.parse_item(item)).collect())
        } else {
            items.iter().map(|item| self.parse_item(item)).collect()
        };

        // Post-join merge in input order keeps the unit list deterministic
        // regardless of completion order.
        for outcome in outcomes {
            if let Some(subgraph) = outcome? {
                merge_subgraph(result, subgraph)?;
            }
        }

        if self.ctx.is_cancelled() {
            Ok(PhaseOutcome::Cancelled)
        } else {
            Ok(PhaseOutcome::Completed)
        }
    }

    /// Expands components to parse items: directory walk, include filter,
    /// language partition, unity grouping.
    fn collect_items(&self) -> Result<Vec<ParseItem>> {
        let config = &*self.ctx.config;
        let mut items: Vec<ParseItem> = Vec::new();

        for component in &config.software_components {
            // Unity groups are one item per (component, language).
            let mut unity_index: Vec<(String, usize)> = Vec::new();

            for file in expand_paths(&component.paths)? {
                if !config.include_allowed(&file) {
                    debug!(file = %file.display(), "filtered by include lists");
                    continue;
                }

                let Some(language) = config.languages.language_for_file(&file) else {
                    if config.fail_on_error {
                        return Err(TranslationError::parse(
                            &file,
                            "no registered language matches this file",
                        ));
                    }
                    self.ctx.record(
                        Diagnostic::warning(
                            "frontend-runner",
                            "no registered language matches this file; skipping",
                        )
                        .with_location(SourceLocation::file_only(&file)),
                    );
                    continue;
                };

                if config.use_unity_build && language.supports_unity_build {
                    match unity_index.iter().find(|(name, _)| name == &language.name) {
                        Some(&(_, index)) => items[index].files.push(file),
                        None => {
                            unity_index.push((language.name.clone(), items.len()));
                            items.push(ParseItem {
                                component: component.name.clone(),
                                language: language.clone(),
                                files: vec![file],
                            });
                        }
                    }
                } else {
                    items.push(ParseItem {
                        component: component.name.clone(),
                        language: language.clone(),
                        files: vec![file],
                    });
                }
            }
        }

        Ok(items)
    }

    /// Drives one frontend over one item's files. Returns `None` when
    /// cancellation struck before a unit was produced or every file failed
    /// non-fatally.
    fn parse_item(&self, item: &ParseItem) -> Result<Option<Subgraph>> {
        let config = &*self.ctx.config;
        let mut frontend = item.language.new_frontend();
        let mut merged: Option<Subgraph> = None;

        for file in &item.files {
            // Cooperative cancellation between files.
            if self.ctx.is_cancelled() {
                break;
            }

            match frontend.parse(file, self.ctx) {
                Ok(subgraph) => {
                    debug!(
                        component = %item.component,
                        language = %item.language.name,
                        file = %file.display(),
                        nodes = subgraph.nodes.len(),
                        "parsed"
                    );
                    merged = Some(match merged.take() {
                        None => subgraph,
                        Some(primary) => merge_unity(primary, subgraph),
                    });
                }
                Err(e) => {
                    if config.fail_on_error {
                        frontend.cleanup();
                        return Err(e);
                    }
                    warn!(file = %file.display(), error = %e, "parse failed, skipping file");
                    self.ctx.record(
                        Diagnostic::error("frontend", e.to_string())
                            .with_location(SourceLocation::file_only(file)),
                    );
                }
            }
        }

        frontend.cleanup();
        Ok(merged)
    }
}

/// Expands directories (sorted, hidden directories skipped) and passes
/// plain files through in their given order.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut expanded: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_entry(|entry| {
                    !(entry.file_type().is_dir()
                        && entry
                            .file_name()
                            .to_str()
                            .map(|name| name.starts_with('.'))
                            .unwrap_or(false))
                })
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();
            expanded.sort();
            files.extend(expanded);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Folds a unity group's next subgraph into the primary one: the surplus
/// unit node is dropped and every edge touching it is rewired onto the
/// primary unit, so the group ends up as one `TranslationUnit`.
fn merge_unity(mut primary: Subgraph, secondary: Subgraph) -> Subgraph {
    let surplus = secondary.unit;
    primary
        .nodes
        .extend(secondary.nodes.into_iter().filter(|n| n.id != surplus));
    for mut edge in secondary.edges {
        if edge.from == surplus {
            edge.from = primary.unit;
        }
        if edge.to == surplus {
            edge.to = primary.unit;
        }
        if edge.from == edge.to {
            continue;
        }
        primary.edges.push(edge);
    }
    primary
}

/// Additive merge: nodes retain their identities; cross-unit references
/// stay unresolved until the symbol resolver runs.
fn merge_subgraph(result: &mut TranslationResult, subgraph: Subgraph) -> Result<()> {
    for node in subgraph.nodes {
        result.add_node(node)?;
    }
    result.add_translation_unit(subgraph.unit)?;
    for edge in subgraph.edges {
        result.add_edge(edge)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cpgraph_core::NodeKind;

    /// Frontend producing an empty unit per file; enough for registry and
    /// runner plumbing tests.
    pub(crate) struct NullFrontend;

    impl LanguageFrontend for NullFrontend {
        fn parse(&mut self, file: &Path, ctx: &TranslationContext) -> Result<Subgraph> {
            let id = ctx.node_ids.next_id();
            let unit = Node::new(id, NodeKind::TranslationUnit, file.display().to_string())
                .with_location(SourceLocation::file_only(file));
            Ok(Subgraph {
                unit: id,
                nodes: vec![unit],
                edges: vec![],
            })
        }
    }

    #[test]
    fn test_merge_unity_rewires_onto_primary_unit() {
        use cpgraph_core::EdgeKind;

        let primary_unit = NodeId(0);
        let secondary_unit = NodeId(10);
        let decl = NodeId(11);

        let primary = Subgraph {
            unit: primary_unit,
            nodes: vec![Node::new(primary_unit, NodeKind::TranslationUnit, "a.c")],
            edges: vec![],
        };
        let secondary = Subgraph {
            unit: secondary_unit,
            nodes: vec![
                Node::new(secondary_unit, NodeKind::TranslationUnit, "b.c"),
                Node::new(decl, NodeKind::FunctionDecl, "f"),
            ],
            edges: vec![Edge::new(secondary_unit, decl, EdgeKind::Ast)],
        };

        let merged = merge_unity(primary, secondary);
        assert_eq!(merged.unit, primary_unit);
        // The surplus unit node is gone; its child hangs off the primary.
        assert!(merged.nodes.iter().all(|n| n.id != secondary_unit));
        assert_eq!(merged.edges.len(), 1);
        assert_eq!(merged.edges[0].from, primary_unit);
        assert_eq!(merged.edges[0].to, decl);
    }

    #[test]
    fn test_expand_paths_keeps_explicit_file_order() {
        let files = vec![PathBuf::from("z.c"), PathBuf::from("a.c")];
        let expanded = expand_paths(&files).unwrap();
        assert_eq!(expanded, files);
    }
}
