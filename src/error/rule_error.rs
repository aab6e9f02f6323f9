use thiserror::Error;

/// Constraint-layer errors.
///
/// Raised when a milestone constraint cannot be compiled, cannot be bound
/// to its owning instance, or fails during evaluation. These abort only
/// the owning process instance, never the whole evaluation batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("unknown constraint dialect: {0}")]
    UnknownDialect(String),
    #[error("constraint compile error: {0}")]
    Compile(String),
    #[error("unresolved constraint binding: {0}")]
    UnresolvedBinding(String),
    #[error("unknown variable: {0}")]
    UnknownVariable(String),
    #[error("unknown fact type: {0}")]
    UnknownFactType(String),
}
