//! Errors raised while loading a process definition document.

use crate::graph::ValidationReport;
use thiserror::Error;

/// Definition-level errors.
///
/// A malformed graph is not a single error: structural problems are
/// collected into a [`ValidationReport`] so a host can show all of them
/// at once.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("definition parse error: {0}")]
    Parse(String),
    #[error("definition is not well-formed")]
    Invalid(Box<ValidationReport>),
    #[error("duplicate definition id: {0}")]
    Duplicate(String),
}

impl DefinitionError {
    /// The validation report, if this error carries one.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            DefinitionError::Invalid(report) => Some(report),
            _ => None,
        }
    }
}
