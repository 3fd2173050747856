//! Per-translation shared state.
//!
//! One `TranslationContext` is created per translation and handed to every
//! frontend and pass. Its lifetime equals the `translate()` call; under
//! `disable_cleanup` the manager retains it afterwards for inspection.

use crate::config::TranslationConfiguration;
use cpgraph_core::{Diagnostic, NodeIdAllocator, ScopeManager, TypeManager};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Cooperative cancellation flag, checked between files during parsing and
/// between passes/groups during enrichment. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Outcome of one phase of a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Completed,
    Cancelled,
}

pub struct TranslationContext {
    pub config: Arc<TranslationConfiguration>,
    pub scope_manager: ScopeManager,
    pub type_manager: TypeManager,
    pub node_ids: NodeIdAllocator,
    diagnostics: Mutex<Vec<Diagnostic>>,
    cancel: CancellationToken,
    run_id: Uuid,
}

impl TranslationContext {
    pub fn new(config: Arc<TranslationConfiguration>, cancel: CancellationToken) -> Self {
        Self {
            config,
            scope_manager: ScopeManager::new(),
            type_manager: TypeManager::new(),
            node_ids: NodeIdAllocator::new(),
            diagnostics: Mutex::new(Vec::new()),
            cancel,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Records a diagnostic; safe from any worker thread.
    pub fn record(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }

    pub fn drain_diagnostics(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }
}
