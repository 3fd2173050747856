//! Translation manager: the public entry point.
//!
//! Owns the state machine of one end-to-end run
//! (`Idle → Parsing → Passing → Finalizing → Done|Failed|Cancelled`,
//! transitions monotonic) and wires the frontend runner, the pass runner
//! and per-translation cleanup together.

use crate::config::TranslationConfiguration;
use crate::context::{CancellationToken, PhaseOutcome, TranslationContext};
use crate::error::{Result, TranslationError};
use crate::frontend::FrontendRunner;
use crate::runner::PassRunner;
use cpgraph_core::{TranslationResult, TranslationStatus, TypeDescriptor};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationState {
    Idle,
    Parsing,
    Passing,
    Finalizing,
    Done,
    Failed,
    Cancelled,
}

impl TranslationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TranslationState::Done | TranslationState::Failed | TranslationState::Cancelled
        )
    }
}

pub struct TranslationManager {
    config: Arc<TranslationConfiguration>,
    state: Mutex<TranslationState>,
    cancel: CancellationToken,
    /// Context kept alive after the run under `disable_cleanup`.
    retained: Mutex<Option<Arc<TranslationContext>>>,
}

impl TranslationManager {
    pub fn builder() -> TranslationManagerBuilder {
        TranslationManagerBuilder { config: None }
    }

    pub fn state(&self) -> TranslationState {
        *self.state.lock()
    }

    /// Token callers set to cancel the running translation; also usable
    /// for caller-side timeouts.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The per-translation context, available after a run only when
    /// `disable_cleanup` was set.
    pub fn context(&self) -> Option<Arc<TranslationContext>> {
        self.retained.lock().clone()
    }

    /// Runs the full translation: parse every component, execute the
    /// scheduled pass groups, assemble the result. Blocks until done.
    pub fn translate(&self) -> Result<TranslationResult> {
        if let Err(e) = self.validate() {
            return self.fail(e);
        }
        self.transition(TranslationState::Idle, TranslationState::Parsing)?;

        let ctx = Arc::new(TranslationContext::new(
            self.config.clone(),
            self.cancel.clone(),
        ));
        info!(
            run = %ctx.run_id(),
            components = self.config.software_components.len(),
            languages = self.config.languages.languages().len(),
            "translation started"
        );

        // Built-in types declared by the registered languages are interned
        // up front so frontends see canonical identities.
        for language in self.config.languages.languages() {
            for builtin in &language.builtin_types {
                ctx.type_manager
                    .register_type(&TypeDescriptor::plain(builtin.as_str()), &ctx.node_ids);
            }
        }

        let mut result = TranslationResult::new();
        result.set_root_scope(ctx.scope_manager.global_scope());

        match FrontendRunner::new(&ctx).run(&mut result) {
            Err(e) => return self.fail(e),
            Ok(PhaseOutcome::Cancelled) => {
                return self.finish_cancelled(ctx, result);
            }
            Ok(PhaseOutcome::Completed) => {}
        }

        self.set_state(TranslationState::Passing);
        match PassRunner::new(&ctx).run(&mut result) {
            Err(e) => return self.fail(e),
            Ok(PhaseOutcome::Cancelled) => {
                return self.finish_cancelled(ctx, result);
            }
            Ok(PhaseOutcome::Completed) => {}
        }

        self.set_state(TranslationState::Finalizing);
        self.finalize(&ctx, &mut result, TranslationStatus::Complete)?;
        self.set_state(TranslationState::Done);
        info!(
            run = %ctx.run_id(),
            units = result.translation_units().len(),
            nodes = result.node_count(),
            edges = result.edge_count(),
            diagnostics = result.diagnostics().len(),
            "translation completed"
        );
        Ok(result)
    }

    fn validate(&self) -> Result<()> {
        if self
            .config
            .software_components
            .iter()
            .all(|c| c.paths.is_empty())
        {
            return Err(TranslationError::config("no source locations configured"));
        }
        if self.config.languages.is_empty() {
            return Err(TranslationError::config("no languages registered"));
        }
        Ok(())
    }

    /// Cancellation is terminal but not an error: the partial result keeps
    /// every enrichment applied before the token fired.
    fn finish_cancelled(
        &self,
        ctx: Arc<TranslationContext>,
        mut result: TranslationResult,
    ) -> Result<TranslationResult> {
        self.set_state(TranslationState::Finalizing);
        self.finalize(&ctx, &mut result, TranslationStatus::Cancelled)?;
        self.set_state(TranslationState::Cancelled);
        info!(run = %ctx.run_id(), "translation cancelled");
        Ok(result)
    }

    fn finalize(
        &self,
        ctx: &Arc<TranslationContext>,
        result: &mut TranslationResult,
        status: TranslationStatus,
    ) -> Result<()> {
        result.extend_diagnostics(ctx.drain_diagnostics());
        for node in ctx.type_manager.take_nodes() {
            if result.node(node.id).is_none() {
                result.add_type_node(node)?;
            }
        }
        result.set_status(status);

        if self.config.disable_cleanup {
            self.retained.lock().replace(ctx.clone());
        } else {
            ctx.scope_manager.clear();
            ctx.type_manager.clear();
        }
        Ok(())
    }

    fn fail(&self, e: TranslationError) -> Result<TranslationResult> {
        error!(error = %e, "translation failed");
        self.set_state(TranslationState::Failed);
        Err(e)
    }

    fn transition(&self, from: TranslationState, to: TranslationState) -> Result<()> {
        let mut state = self.state.lock();
        if *state != from {
            return Err(TranslationError::internal(format!(
                "translation is {:?}, expected {:?}; a translation cannot be resumed or rerun",
                *state, from
            )));
        }
        debug!(?from, ?to, "state transition");
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: TranslationState) {
        let mut state = self.state.lock();
        debug!(from = ?*state, ?to, "state transition");
        *state = to;
    }
}

pub struct TranslationManagerBuilder {
    config: Option<TranslationConfiguration>,
}

impl TranslationManagerBuilder {
    pub fn config(mut self, config: TranslationConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<TranslationManager> {
        let config = self
            .config
            .ok_or_else(|| TranslationError::config("translation manager needs a configuration"))?;
        Ok(TranslationManager {
            config: Arc::new(config),
            state: Mutex::new(TranslationState::Idle),
            cancel: CancellationToken::new(),
            retained: Mutex::new(None),
        })
    }
}
