//! End-to-end translation: parsing, enrichment, cancellation, cleanup.

mod common;

use common::{toy_language, write_file};
use cpgraph_translation::{
    Diagnostic, EdgeKind, GraphDelta, InferenceConfiguration, NodeKind, Pass, PassContext,
    PassDescriptor, PassRegistration, TranslationConfiguration, TranslationManager,
    TranslationResult, TranslationState,
};
use std::sync::Arc;
use tempfile::tempdir;

fn manager_for(config: TranslationConfiguration) -> TranslationManager {
    TranslationManager::builder().config(config).build().unwrap()
}

#[test]
fn test_translation_produces_one_enriched_unit_per_file() {
    let dir = tempdir().unwrap();
    let a = write_file(
        dir.path(),
        "a.toy",
        "func main\n  var x int\n  set x = 1\n  use x\n  call helper\n  return\nend\n",
    );
    let b = write_file(dir.path(), "b.toy", "func helper\n  return\nend\n");

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&a, &b])
        .build()
        .unwrap();
    let manager = manager_for(config);
    let result = manager.translate().unwrap();

    assert_eq!(manager.state(), TranslationState::Done);
    assert!(!result.was_cancelled());

    // One unit per file, in input order, renamed by the filename mapper.
    let unit_names: Vec<_> = result
        .translation_units()
        .iter()
        .map(|&id| result.node(id).unwrap().name.as_str())
        .collect();
    assert_eq!(unit_names, vec!["a.toy", "b.toy"]);

    // Every non-root node has exactly one AST parent.
    for node in result.nodes() {
        if node.kind == NodeKind::TranslationUnit
            || matches!(node.kind, NodeKind::Type { .. })
            || node.inferred
        {
            continue;
        }
        assert!(
            result.ast_parent(node.id).is_some(),
            "{} node '{}' has no AST parent",
            node.kind.label(),
            node.name
        );
    }

    // The cross-unit call resolved statically to the parsed declaration.
    let call = result
        .nodes()
        .find(|n| n.kind == NodeKind::CallExpr && n.name == "helper")
        .unwrap();
    let helper = result
        .nodes()
        .find(|n| n.kind == NodeKind::FunctionDecl && n.name == "helper")
        .unwrap();
    assert!(result.has_edge(call.id, helper.id, EdgeKind::Invokes));
    assert!(!helper.inferred);

    // Reference resolution, data flow and evaluation order all landed.
    let x_decl = result
        .nodes()
        .find(|n| matches!(n.kind, NodeKind::VariableDecl { .. }) && n.name == "x")
        .unwrap();
    let x_use = result
        .nodes()
        .find(|n| {
            n.kind == NodeKind::Reference
                && n.name == "x"
                && result.ast_parent(n.id).map(|p| result.node(p).unwrap().kind.clone())
                    != Some(NodeKind::AssignExpr)
        })
        .unwrap();
    assert!(result.has_edge(x_use.id, x_decl.id, EdgeKind::RefersTo));
    assert!(result.has_edge(x_decl.id, x_use.id, EdgeKind::Dfg));
    assert!(result.edges().iter().any(|e| e.kind == EdgeKind::Eog));

    // The declared type was interned and linked.
    let int_type = result
        .nodes()
        .find(|n| n.kind == NodeKind::Type { key: "int".to_string() })
        .unwrap();
    assert!(result.has_edge(x_decl.id, int_type.id, EdgeKind::TypeUsage));
}

#[test]
fn test_files_without_a_language_are_skipped_with_a_diagnostic() {
    let dir = tempdir().unwrap();
    let toy = write_file(dir.path(), "a.toy", "func main\nend\n");
    let readme = write_file(dir.path(), "README.md", "# docs\n");

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&toy, &readme])
        .build()
        .unwrap();
    let result = manager_for(config).translate().unwrap();

    assert_eq!(result.translation_units().len(), 1);
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("no registered language")));

    // Under fail_on_error the same input aborts the translation.
    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&toy, &readme])
        .fail_on_error(true)
        .build()
        .unwrap();
    let manager = manager_for(config);
    assert!(manager.translate().is_err());
    assert_eq!(manager.state(), TranslationState::Failed);
}

#[test]
fn test_parse_errors_skip_the_file_unless_fail_on_error() {
    let dir = tempdir().unwrap();
    let good = write_file(dir.path(), "good.toy", "func main\nend\n");
    let bad = write_file(dir.path(), "bad.toy", "gibberish here\n");

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&good, &bad])
        .build()
        .unwrap();
    let result = manager_for(config).translate().unwrap();

    assert_eq!(result.translation_units().len(), 1);
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("unknown directive")));

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&good, &bad])
        .fail_on_error(true)
        .build()
        .unwrap();
    let err = manager_for(config).translate().unwrap_err();
    assert!(err.to_string().contains("unknown directive"));
}

#[test]
fn test_references_to_functions_and_records_translate_cleanly() {
    let dir = tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "a.toy",
        "record Thing\nfunc helper\n  return\nend\nfunc main\n  use helper\n  use Thing\nend\n",
    );

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&file])
        .build()
        .unwrap();
    let result = manager_for(config).translate().unwrap();

    // Both references resolve, but neither declaration sources data flow.
    let helper = result
        .nodes()
        .find(|n| n.kind == NodeKind::FunctionDecl && n.name == "helper")
        .unwrap();
    let thing = result
        .nodes()
        .find(|n| matches!(n.kind, NodeKind::RecordDecl { .. }) && n.name == "Thing")
        .unwrap();
    for reference in result.nodes().filter(|n| n.kind == NodeKind::Reference) {
        assert!(result
            .edges_from_kind(reference.id, EdgeKind::RefersTo)
            .next()
            .is_some());
    }
    assert!(result
        .edges_from_kind(helper.id, EdgeKind::Dfg)
        .next()
        .is_none());
    assert!(result
        .edges_from_kind(thing.id, EdgeKind::Dfg)
        .next()
        .is_none());
}

#[test]
fn test_serial_translation_is_deterministic() {
    let dir = tempdir().unwrap();
    let a = write_file(
        dir.path(),
        "a.toy",
        "record Base\nrecord Derived : Base\nfunc main\n  var x int\n  set x = 2\n  use x\nend\n",
    );
    let b = write_file(dir.path(), "b.toy", "import a\nfunc helper\nend\n");

    let translate = || {
        let config = TranslationConfiguration::builder()
            .default_passes()
            .register_language(toy_language())
            .source_locations([&a, &b])
            .build()
            .unwrap();
        manager_for(config).translate().unwrap()
    };

    let first = translate();
    let second = translate();

    let snapshot = |result: &TranslationResult| {
        let nodes: Vec<_> = result
            .nodes()
            .map(|n| (n.id, n.kind.label(), n.name.clone()))
            .collect();
        let mut edges: Vec<_> = result
            .edges()
            .iter()
            .map(|e| (e.from, e.to, e.kind))
            .collect();
        edges.sort();
        (nodes, edges)
    };
    assert_eq!(snapshot(&first), snapshot(&second));
}

#[test]
fn test_parallel_frontends_keep_unit_order_deterministic() {
    let dir = tempdir().unwrap();
    let files: Vec<_> = (0..8)
        .map(|i| {
            write_file(
                dir.path(),
                &format!("f{i}.toy"),
                &format!("func f{i}\n  return\nend\n"),
            )
        })
        .collect();

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations(files.iter())
        .use_parallel_frontends(true)
        .build()
        .unwrap();
    let result = manager_for(config).translate().unwrap();

    let unit_names: Vec<_> = result
        .translation_units()
        .iter()
        .map(|&id| result.node(id).unwrap().name.clone())
        .collect();
    let expected: Vec<_> = (0..8).map(|i| format!("f{i}.toy")).collect();
    assert_eq!(unit_names, expected);
}

#[test]
fn test_unity_build_merges_a_component_into_one_unit() {
    let dir = tempdir().unwrap();
    let a = write_file(dir.path(), "a.toy", "func one\nend\n");
    let b = write_file(dir.path(), "b.toy", "func two\nend\n");

    let build = |unity: bool| {
        let config = TranslationConfiguration::builder()
            .default_passes()
            .register_language(toy_language().unity_capable())
            .source_locations([&a, &b])
            .use_unity_build(unity)
            .build()
            .unwrap();
        manager_for(config).translate().unwrap()
    };

    let merged = build(true);
    assert_eq!(merged.translation_units().len(), 1);
    let unit = merged.translation_units()[0];
    let functions: Vec<_> = merged
        .ast_children(unit)
        .into_iter()
        .filter_map(|id| merged.node(id))
        .filter(|n| n.kind == NodeKind::FunctionDecl)
        .map(|n| n.name.clone())
        .collect();
    assert!(functions.contains(&"one".to_string()));
    assert!(functions.contains(&"two".to_string()));

    let split = build(false);
    assert_eq!(split.translation_units().len(), 2);
}

static CANCEL_NOW: PassDescriptor = PassDescriptor::named("cancel-now");
static AFTER_CANCEL: PassDescriptor = PassDescriptor {
    hard_deps: &["cancel-now"],
    ..PassDescriptor::named("after-cancel")
};

struct CancelPass;

impl Pass for CancelPass {
    fn descriptor(&self) -> &'static PassDescriptor {
        &CANCEL_NOW
    }

    fn accept(
        &self,
        _result: &TranslationResult,
        ctx: &PassContext<'_>,
    ) -> cpgraph_translation::Result<GraphDelta> {
        ctx.translation.cancellation_token().cancel();
        Ok(GraphDelta {
            diagnostics: vec![Diagnostic::info("cancel-now", "first group ran")],
            ..GraphDelta::default()
        })
    }
}

struct AfterPass;

impl Pass for AfterPass {
    fn descriptor(&self) -> &'static PassDescriptor {
        &AFTER_CANCEL
    }

    fn accept(
        &self,
        _result: &TranslationResult,
        _ctx: &PassContext<'_>,
    ) -> cpgraph_translation::Result<GraphDelta> {
        Ok(GraphDelta {
            diagnostics: vec![Diagnostic::info("after-cancel", "second group ran")],
            ..GraphDelta::default()
        })
    }
}

#[test]
fn test_cancellation_between_groups_keeps_earlier_enrichments() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.toy", "func main\nend\n");

    let config = TranslationConfiguration::builder()
        .register_pass_with(PassRegistration::new(&CANCEL_NOW, || Arc::new(CancelPass)))
        .register_pass_with(PassRegistration::new(&AFTER_CANCEL, || Arc::new(AfterPass)))
        .register_language(toy_language())
        .source_locations([&file])
        .build()
        .unwrap();
    let manager = manager_for(config);
    let result = manager.translate().unwrap();

    assert!(result.was_cancelled());
    assert_eq!(manager.state(), TranslationState::Cancelled);
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.message == "first group ran"));
    assert!(!result
        .diagnostics()
        .iter()
        .any(|d| d.message == "second group ran"));
}

#[test]
fn test_cancellation_before_parsing_yields_an_empty_result() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.toy", "func main\nend\n");

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&file])
        .build()
        .unwrap();
    let manager = manager_for(config);
    manager.cancellation_token().cancel();

    let result = manager.translate().unwrap();
    assert!(result.was_cancelled());
    assert_eq!(result.translation_units().len(), 0);
    assert_eq!(manager.state(), TranslationState::Cancelled);
}

#[test]
fn test_cleanup_tears_down_managers_unless_disabled() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.toy", "func main\n  var x int\nend\n");

    let build = |disable_cleanup: bool| {
        let config = TranslationConfiguration::builder()
            .default_passes()
            .register_language(toy_language())
            .source_locations([&file])
            .disable_cleanup(disable_cleanup)
            .build()
            .unwrap();
        manager_for(config)
    };

    let manager = build(false);
    manager.translate().unwrap();
    assert!(manager.context().is_none());

    let manager = build(true);
    manager.translate().unwrap();
    let ctx = manager.context().expect("context retained");
    // The scope tree still holds the function scope and the interning
    // table still answers.
    assert!(ctx.scope_manager.scope_count() > 1);
    assert!(ctx.type_manager.lookup("int").is_some());
}

#[test]
fn test_rerunning_the_schedule_changes_nothing() {
    let dir = tempdir().unwrap();
    let file = write_file(
        dir.path(),
        "a.toy",
        "func main\n  var x int\n  set x = 1\n  use x\n  call main\nend\n",
    );

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&file])
        .disable_cleanup(true)
        .build()
        .unwrap();
    let manager = manager_for(config);
    let mut result = manager.translate().unwrap();
    let ctx = manager.context().expect("context retained");

    let nodes_before = result.node_count();
    let edges_before = result.edge_count();

    cpgraph_translation::PassRunner::new(&ctx)
        .run(&mut result)
        .unwrap();

    assert_eq!(result.node_count(), nodes_before);
    assert_eq!(result.edge_count(), edges_before);
}

#[test]
fn test_translation_cannot_be_rerun() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.toy", "func main\nend\n");

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&file])
        .build()
        .unwrap();
    let manager = manager_for(config);
    manager.translate().unwrap();

    let err = manager.translate().unwrap_err();
    assert!(err.to_string().contains("cannot be resumed"));
}

#[test]
fn test_unknown_call_target_is_inferred_or_diagnosed() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.toy", "func main\n  call phantom\nend\n");

    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&file])
        .build()
        .unwrap();
    let result = manager_for(config).translate().unwrap();

    let inferred = result
        .nodes()
        .find(|n| n.inferred && n.kind == NodeKind::FunctionDecl)
        .expect("inferred function");
    assert_eq!(inferred.name, "phantom");
    let call = result
        .nodes()
        .find(|n| n.kind == NodeKind::CallExpr)
        .unwrap();
    assert!(result.has_edge(call.id, inferred.id, EdgeKind::Invokes));

    // With inference off the failure is recorded, never fatal.
    let config = TranslationConfiguration::builder()
        .default_passes()
        .register_language(toy_language())
        .source_locations([&file])
        .inference(InferenceConfiguration::disabled())
        .build()
        .unwrap();
    let result = manager_for(config).translate().unwrap();
    assert!(result.nodes().all(|n| !n.inferred));
    assert!(result
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("phantom")));
}

#[test]
fn test_code_snippets_follow_the_code_in_nodes_flag() {
    let dir = tempdir().unwrap();
    let file = write_file(dir.path(), "a.toy", "func main\nend\n");

    let build = |code_in_nodes: bool| {
        let config = TranslationConfiguration::builder()
            .default_passes()
            .register_language(toy_language())
            .source_locations([&file])
            .code_in_nodes(code_in_nodes)
            .build()
            .unwrap();
        manager_for(config).translate().unwrap()
    };

    let with_code = build(true);
    let func = with_code
        .nodes()
        .find(|n| n.kind == NodeKind::FunctionDecl)
        .unwrap();
    assert_eq!(func.code.as_deref(), Some("func main"));

    let without_code = build(false);
    let func = without_code
        .nodes()
        .find(|n| n.kind == NodeKind::FunctionDecl)
        .unwrap();
    assert!(func.code.is_none());
}

#[test]
fn test_parallel_passes_produce_the_same_graph() {
    let dir = tempdir().unwrap();
    let a = write_file(
        dir.path(),
        "a.toy",
        "func main\n  var x int\n  set x = 1\n  use x\n  call helper\nend\n",
    );
    let b = write_file(dir.path(), "b.toy", "func helper\n  return\nend\n");

    let translate = |parallel: bool| {
        let config = TranslationConfiguration::builder()
            .default_passes()
            .register_language(toy_language())
            .source_locations([&a, &b])
            .use_parallel_passes(parallel)
            .build()
            .unwrap();
        manager_for(config).translate().unwrap()
    };

    let serial = translate(false);
    let parallel = translate(true);

    let snapshot = |result: &TranslationResult| {
        let mut edges: Vec<_> = result
            .edges()
            .iter()
            .map(|e| (e.from, e.to, e.kind))
            .collect();
        edges.sort();
        (result.node_count(), edges)
    };
    assert_eq!(snapshot(&serial), snapshot(&parallel));
}
