//! Diagnostics accumulated during a translation.
//!
//! Parse and resolution problems are recorded here instead of aborting;
//! the result exposes them even on success.

use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single recorded problem: severity, optional source location, the
/// component that reported it, and a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Option<SourceLocation>,
    pub component: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(severity: Severity, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            location: None,
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn error(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, component, message)
    }

    pub fn warning(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, component, message)
    }

    pub fn info(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, component, message)
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(loc) => write!(
                f,
                "[{}] {}: {} ({})",
                self.severity, self.component, self.message, loc
            ),
            None => write!(f, "[{}] {}: {}", self.severity, self.component, self.message),
        }
    }
}
