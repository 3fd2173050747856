//! Built-in default passes.
//!
//! Execution order is declared on each pass's descriptor, never by list
//! position; the scheduler derives the actual grouping.

mod dataflow;
mod filenames;
mod hierarchy;
mod imports;
mod invokes;
mod order;
mod symbols;
mod types;

pub use dataflow::{ControlFlowSensitiveDfg, DataFlowPass};
pub use filenames::FilenameMapper;
pub use hierarchy::TypeHierarchyResolver;
pub use imports::ImportResolver;
pub use invokes::DynamicInvokeResolver;
pub use order::EvaluationOrderPass;
pub use symbols::SymbolResolver;
pub use types::TypeResolver;

use crate::pass::PassRegistration;

/// Canonical default pass set, seeded by
/// `TranslationConfigurationBuilder::default_passes`.
pub const DEFAULT_PASS_NAMES: &[&str] = &[
    "type-hierarchy-resolver",
    "import-resolver",
    "symbol-resolver",
    "data-flow-graph",
    "dynamic-invoke-resolver",
    "evaluation-order-graph",
    "type-resolver",
    "control-flow-sensitive-dfg",
    "filename-mapper",
];

pub(crate) fn builtin_registrations() -> Vec<PassRegistration> {
    vec![
        hierarchy::registration(),
        imports::registration(),
        symbols::registration(),
        dataflow::registration(),
        dataflow::cfs_registration(),
        invokes::registration(),
        order::registration(),
        types::registration(),
        filenames::registration(),
    ]
}
