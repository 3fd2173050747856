//! Pass scheduler: dependency resolution and parallel-group extraction.
//!
//! Input is the set of registered pass names plus the replacement map the
//! configuration computed before scheduling. Hard dependencies that were
//! never registered are injected transitively through the catalog. Output
//! is an ordered list of groups; passes within one group carry no ordering
//! constraints between each other.

use crate::error::{Result, TranslationError};
use crate::pass::PassCatalog;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};

/// Computes the grouped execution order for `registered` passes.
///
/// `renames` maps replaced pass names onto their replacements; it is
/// applied to the registered set and to every dependency reference, so
/// constraints declared against a replaced pass are rewritten onto its
/// replacement.
pub fn schedule(
    registered: &[&'static str],
    renames: &FxHashMap<&'static str, &'static str>,
    catalog: &PassCatalog,
) -> Result<Vec<Vec<&'static str>>> {
    let resolve = |name: &'static str| -> &'static str {
        renames.get(name).copied().unwrap_or(name)
    };

    // Registered set with replacements applied; duplicate registration is
    // idempotent.
    let mut active: Vec<&'static str> = Vec::new();
    let mut present: FxHashSet<&'static str> = FxHashSet::default();
    for &name in registered {
        let name = resolve(name);
        if present.insert(name) {
            active.push(name);
        }
    }

    // Inject missing hard dependencies until fixpoint.
    let mut cursor = 0;
    while cursor < active.len() {
        let name = active[cursor];
        cursor += 1;
        let descriptor = catalog
            .lookup(name)
            .ok_or_else(|| TranslationError::config(format!("unknown pass '{name}'")))?
            .descriptor();
        for &dep in descriptor.hard_deps.iter().chain(descriptor.soft_deps) {
            if resolve(dep) == name {
                return Err(TranslationError::config(format!(
                    "pass '{name}' depends on itself"
                )));
            }
        }
        for &dep in descriptor.hard_deps {
            let dep = resolve(dep);
            if present.insert(dep) {
                active.push(dep);
            }
        }
    }

    // First/last markers: at most one pass each.
    let mut first: Option<&'static str> = None;
    let mut last: Option<&'static str> = None;
    for &name in &active {
        let descriptor = catalog.lookup(name).expect("injected from catalog").descriptor();
        if descriptor.first {
            if first.replace(name).is_some() {
                return Err(TranslationError::config("too many first passes"));
            }
        }
        if descriptor.last {
            if last.replace(name).is_some() {
                return Err(TranslationError::config("too many last passes"));
            }
        }
    }
    if first.is_some() && first == last {
        return Err(TranslationError::config(format!(
            "pass '{}' is marked both first and last",
            first.unwrap()
        )));
    }

    // Dependency graph: an edge A -> B means A must run before B.
    let mut graph: DiGraph<&'static str, ()> = DiGraph::new();
    let mut index: FxHashMap<&'static str, NodeIndex> = FxHashMap::default();
    for &name in &active {
        index.insert(name, graph.add_node(name));
    }
    for &name in &active {
        let descriptor = catalog.lookup(name).expect("injected from catalog").descriptor();
        let to = index[name];
        for &dep in descriptor.hard_deps {
            let dep = resolve(dep);
            graph.update_edge(index[dep], to, ());
        }
        for &dep in descriptor.soft_deps {
            let dep = resolve(dep);
            if let Some(&from) = index.get(dep) {
                graph.update_edge(from, to, ());
            }
        }
        for &successor in descriptor.execute_before {
            let successor = resolve(successor);
            if let Some(&succ) = index.get(successor) {
                graph.update_edge(to, succ, ());
            }
        }
    }

    let mut in_degree: FxHashMap<&'static str, usize> = active
        .iter()
        .map(|&name| {
            (
                name,
                graph
                    .neighbors_directed(index[name], Direction::Incoming)
                    .count(),
            )
        })
        .collect();
    let mut remaining: FxHashSet<&'static str> = active.iter().copied().collect();
    let mut groups: Vec<Vec<&'static str>> = Vec::new();

    let emit = |name: &'static str,
                    remaining: &mut FxHashSet<&'static str>,
                    in_degree: &mut FxHashMap<&'static str, usize>| {
        remaining.remove(name);
        for succ in graph.neighbors_directed(index[name], Direction::Outgoing) {
            let succ = graph[succ];
            if remaining.contains(succ) {
                *in_degree.get_mut(succ).expect("tracked") -= 1;
            }
        }
    };

    // The first pass forms its own leading group.
    if let Some(name) = first {
        emit(name, &mut remaining, &mut in_degree);
        groups.push(vec![name]);
    }

    loop {
        // Everything with no unmet predecessor, in registration order for
        // deterministic output; the last pass is held back.
        let ready: Vec<&'static str> = active
            .iter()
            .copied()
            .filter(|name| {
                remaining.contains(name) && Some(*name) != last && in_degree[name] == 0
            })
            .collect();

        if ready.is_empty() {
            let stuck = remaining.len() - usize::from(last.map_or(false, |l| remaining.contains(l)));
            if stuck > 0 {
                return Err(TranslationError::config(
                    "failed to satisfy ordering requirements",
                ));
            }
            break;
        }

        for &name in &ready {
            emit(name, &mut remaining, &mut in_degree);
        }
        groups.push(ready);
    }

    // The last pass forms its own trailing group.
    if let Some(name) = last {
        if remaining.contains(name) {
            groups.push(vec![name]);
        }
    }

    Ok(groups)
}
