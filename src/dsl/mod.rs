//! Declarative process definition documents.

mod parser;
mod schema;

pub use parser::{parse_definition, DefinitionFormat};
pub use schema::{
    ConnectionSchema, ConstraintSchema, HeaderSchema, NodeSchema, ProcessSchema, VariableDecl,
};
