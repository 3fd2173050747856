/*
 * cpgraph-translation - Code Property Graph Construction
 *
 * Everything that builds the graph:
 * - Language registry and name-keyed factory catalog
 * - Translation configuration (builder-only, immutable once built)
 * - Pass scheduler: hard/soft/first/last constraints, missing-dependency
 *   injection, parallel-group extraction, deadlock detection
 * - Frontend runner: component expansion, unity builds, parallel parsing
 * - Pass runner: barrier-ordered group execution
 * - Translation manager: lifecycle, cancellation, result assembly
 */

pub mod compdb;
pub mod config;
pub mod context;
pub mod error;
pub mod frontend;
pub mod language;
pub mod manager;
pub mod pass;
pub mod passes;
pub mod runner;
pub mod schedule;

pub use compdb::{CompilationDatabase, CompilationEntry};
pub use config::{
    InferenceConfiguration, SoftwareComponent, TranslationConfiguration,
    TranslationConfigurationBuilder, DEFAULT_COMPONENT,
};
pub use context::{CancellationToken, PhaseOutcome, TranslationContext};
pub use error::{Result, TranslationError};
pub use frontend::{FrontendRunner, LanguageFrontend, Subgraph};
pub use language::{FrontendFactory, Language, LanguageCatalog, LanguageRegistry, ReplacePassRule};
pub use manager::{TranslationManager, TranslationManagerBuilder, TranslationState};
pub use pass::{GraphDelta, Pass, PassCatalog, PassContext, PassDescriptor, PassRegistration};
pub use runner::PassRunner;

// The graph model is re-exported so most users only depend on this crate.
pub use cpgraph_core::{
    Diagnostic, Edge, EdgeKind, EdgeProperties, Node, NodeId, NodeIdAllocator, NodeKind,
    ScopeId, ScopeKind, ScopeManager, Severity, SourceLocation, Span, TranslationResult,
    TranslationStatus, TypeDescriptor, TypeManager,
};
