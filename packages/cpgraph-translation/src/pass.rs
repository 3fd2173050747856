//! Pass contract: descriptors, the execution trait, and the catalog.
//!
//! Dependency metadata is static data on each pass type (the port of the
//! source's reflection-read annotations): name, hard/soft predecessors,
//! execute-before successors, first/last markers, and the parallel-safety
//! opt-in consulted by the pass runner.

use crate::context::TranslationContext;
use crate::error::Result;
use cpgraph_core::{Diagnostic, Edge, Node, NodeId, TranslationResult};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Static metadata describing one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassDescriptor {
    pub name: &'static str,
    /// Must run before this pass; added to the schedule even when not
    /// registered.
    pub hard_deps: &'static [&'static str],
    /// Must run before this pass when present; ignored otherwise.
    pub soft_deps: &'static [&'static str],
    /// This pass must run before each named pass when present.
    pub execute_before: &'static [&'static str],
    /// At most one registered pass may carry this marker.
    pub first: bool,
    /// At most one registered pass may carry this marker.
    pub last: bool,
    /// Whether this pass may run concurrently with others of its group.
    pub parallel_safe: bool,
}

impl PassDescriptor {
    /// Descriptor with no constraints, for passes that only need a name.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            hard_deps: &[],
            soft_deps: &[],
            execute_before: &[],
            first: false,
            last: false,
            parallel_safe: false,
        }
    }
}

/// Everything a pass may read besides the graph.
pub struct PassContext<'a> {
    pub translation: &'a TranslationContext,
    /// Opaque per-pass configuration from the translation configuration.
    pub config: Option<&'a serde_json::Value>,
}

/// Mutations a pass computed against the shared graph view. Deltas are
/// applied at the group barrier in registration order, which keeps passes
/// of one group commutative on graph state.
#[derive(Default)]
pub struct GraphDelta {
    /// Appended nodes (inference only; single writer per pass).
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Node renames, applied before edges.
    pub renames: Vec<(NodeId, String)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GraphDelta {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.edges.is_empty()
            && self.renames.is_empty()
            && self.diagnostics.is_empty()
    }
}

/// A graph enrichment step. A pass may not assume the presence of any
/// later pass's output.
pub trait Pass: Send + Sync {
    fn descriptor(&self) -> &'static PassDescriptor;

    /// Computes this pass's enrichment of the graph.
    fn accept(&self, result: &TranslationResult, ctx: &PassContext<'_>) -> Result<GraphDelta>;
}

/// A pass type bundled with its construction.
#[derive(Clone)]
pub struct PassRegistration {
    descriptor: &'static PassDescriptor,
    factory: Arc<dyn Fn() -> Arc<dyn Pass> + Send + Sync>,
}

impl PassRegistration {
    pub fn new(
        descriptor: &'static PassDescriptor,
        factory: impl Fn() -> Arc<dyn Pass> + Send + Sync + 'static,
    ) -> Self {
        Self {
            descriptor,
            factory: Arc::new(factory),
        }
    }

    pub fn descriptor(&self) -> &'static PassDescriptor {
        self.descriptor
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn instantiate(&self) -> Arc<dyn Pass> {
        (self.factory)()
    }
}

impl std::fmt::Debug for PassRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PassRegistration({})", self.descriptor.name)
    }
}

/// Name-keyed pass registry. The scheduler resolves unregistered hard
/// dependencies through it; unknown names are configuration errors.
#[derive(Debug, Clone, Default)]
pub struct PassCatalog {
    entries: FxHashMap<&'static str, PassRegistration>,
}

impl PassCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-populated with every built-in default pass.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for registration in crate::passes::builtin_registrations() {
            catalog.register(registration);
        }
        catalog
    }

    pub fn register(&mut self, registration: PassRegistration) {
        self.entries.insert(registration.name(), registration);
    }

    pub fn lookup(&self, name: &str) -> Option<&PassRegistration> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}
