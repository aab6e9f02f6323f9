//! The immutable process definition graph.

mod builder;
mod types;
mod validator;

pub use builder::{build_definition, ProcessDefinition};
pub use types::{
    Connection, ConstraintSource, NodeKind, ProcessHeader, ProcessNode, VariableDeclaration,
};
pub use validator::{validate_schema, Diagnostic, DiagnosticLevel, ValidationReport};
