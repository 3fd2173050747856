/*
 * cpgraph-core - Code Property Graph Model
 *
 * The graph half of the code property graph library:
 * - Node/edge taxonomy with per-kind edge label validation
 * - Source spans and diagnostics
 * - The translation result arena (identity-referenced, cycle-safe)
 * - Translation-scoped scope and type managers with internally
 *   synchronized mutation, safe under parallel frontends
 */

pub mod diagnostics;
pub mod edge;
pub mod error;
pub mod node;
pub mod result;
pub mod scope;
pub mod span;
pub mod types;

pub use diagnostics::{Diagnostic, Severity};
pub use edge::{Edge, EdgeKind, EdgeProperties};
pub use error::{CoreError, Result};
pub use node::{Node, NodeId, NodeIdAllocator, NodeKind};
pub use result::{TranslationResult, TranslationStatus};
pub use scope::{ScopeId, ScopeKind, ScopeManager};
pub use span::{SourceLocation, Span};
pub use types::{TypeDescriptor, TypeManager};
