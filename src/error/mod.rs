//! Error types, layered the way the engine is: definition loading,
//! session/API misuse, and constraint compilation/evaluation.

mod definition_error;
mod engine_error;
mod rule_error;

pub use definition_error::DefinitionError;
pub use engine_error::EngineError;
pub use rule_error::RuleError;
