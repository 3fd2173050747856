//! Error types for the translation layer.

use cpgraph_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranslationError>;

#[derive(Debug, Error)]
pub enum TranslationError {
    /// Invalid builder state, unresolved pass ordering, too many
    /// first/last passes, unknown language or pass name. Fatal to the
    /// call that raised it.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A frontend could not process a file. Fatal only under
    /// `fail_on_error`; otherwise recorded as a diagnostic.
    #[error("parse error in {file}: {message}")]
    Parse { file: PathBuf, message: String },

    /// Symbol or type resolution failed. Recorded, never fatal; passes
    /// tolerate partial graphs.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// Invariant violation, surfaced with component context.
    #[error("internal error: {0}")]
    Internal(String),

    /// Token-triggered termination.
    #[error("translation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl TranslationError {
    pub fn config<M: std::fmt::Display>(msg: M) -> Self {
        Self::Configuration(msg.to_string())
    }

    pub fn internal<M: std::fmt::Display>(msg: M) -> Self {
        Self::Internal(msg.to_string())
    }

    pub fn parse(file: impl Into<PathBuf>, msg: impl std::fmt::Display) -> Self {
        Self::Parse {
            file: file.into(),
            message: msg.to_string(),
        }
    }
}
