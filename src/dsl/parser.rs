//! Definition parser: converts raw YAML/JSON text into [`ProcessSchema`].

use super::schema::ProcessSchema;
use crate::error::DefinitionError;

/// Supported definition document formats.
#[derive(Debug, Clone, Copy)]
pub enum DefinitionFormat {
    /// YAML format (`.yaml` / `.yml`).
    Yaml,
    /// JSON format (`.json`).
    Json,
}

/// Parse definition content into a ProcessSchema
pub fn parse_definition(
    content: &str,
    format: DefinitionFormat,
) -> Result<ProcessSchema, DefinitionError> {
    match format {
        DefinitionFormat::Yaml => {
            serde_saphyr::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))
        }
        DefinitionFormat::Json => {
            serde_json::from_str(content).map_err(|e| DefinitionError::Parse(e.to_string()))
        }
    }
}
