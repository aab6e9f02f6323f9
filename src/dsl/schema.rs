use serde::{Deserialize, Serialize};

// ================================
// Process definition document
// ================================

/// Declarative process document, deserialized from YAML or JSON.
///
/// The document declares a `header` (imported fact types and instance
/// variable declarations), `nodes`, and directed `connections` between
/// node ids.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProcessSchema {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub header: HeaderSchema,
    pub nodes: Vec<NodeSchema>,
    #[serde(default)]
    pub connections: Vec<ConnectionSchema>,
}

/// Header block: fact types the definition's constraints may match
/// against, plus instance variable declarations.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct HeaderSchema {
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub variables: Vec<VariableDecl>,
}

/// Instance variable declaration. The type name is resolved against the
/// engine's value model at graph build; omitting it declares `any`.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct VariableDecl {
    pub name: String,
    #[serde(rename = "type", default)]
    pub var_type: Option<String>,
}

/// Node definition. The `type` field selects the activation semantics;
/// only milestone nodes carry a constraint.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NodeSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub constraint: Option<ConstraintSchema>,
}

/// Opaque constraint source: dialect tag plus text, compiled only when
/// the milestone activates.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConstraintSchema {
    #[serde(default = "default_dialect")]
    pub dialect: String,
    pub text: String,
}

fn default_dialect() -> String {
    "condition".to_string()
}

/// Directed connection between two node ids.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ConnectionSchema {
    pub from: String,
    pub to: String,
}
