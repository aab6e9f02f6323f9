use thiserror::Error;

/// Session-level errors: unknown ids, operations against terminal state,
/// and start-parameter validation failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("definition not found: {0}")]
    DefinitionNotFound(String),
    #[error("process instance not found: {0}")]
    InstanceNotFound(u64),
    #[error("fact not found: {0}")]
    FactNotFound(u64),
    #[error("invalid transition on process instance {instance_id}: {reason}")]
    InvalidTransition { instance_id: u64, reason: String },
    #[error("start parameter '{name}' is not declared in the definition header")]
    UndeclaredVariable { name: String },
    #[error("start parameter '{name}' does not match its declared type '{expected}'")]
    TypeMismatch { name: String, expected: String },
    #[error("internal error: {0}")]
    Internal(String),
}
