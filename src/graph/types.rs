use crate::value::DataType;

/// Graph node
#[derive(Debug, Clone)]
pub struct ProcessNode {
    /// Node id (corresponds to the document's id)
    pub id: String,

    /// Display name
    pub name: String,

    /// Activation semantics
    pub kind: NodeKind,
}

/// Node kinds and their activation semantics.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Completes immediately on start and propagates.
    Start,
    /// Completes immediately; completes the owning instance once no
    /// other node instance is still active.
    End,
    /// Stays active until its constraint is satisfied by a fact.
    Milestone { constraint: ConstraintSource },
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Milestone { .. } => "milestone",
        }
    }
}

/// Constraint text plus dialect tag, opaque to the graph layer.
/// Compiled into a predicate only when the milestone activates.
#[derive(Debug, Clone)]
pub struct ConstraintSource {
    pub dialect: String,
    pub text: String,
}

/// Directed connection between two node ids.
#[derive(Debug, Clone)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

/// Header metadata carried from the document onto the built definition.
#[derive(Debug, Clone, Default)]
pub struct ProcessHeader {
    /// Fact type names the definition's constraints may match against.
    pub imports: Vec<String>,
    /// Instance variable declarations.
    pub variables: Vec<VariableDeclaration>,
}

impl ProcessHeader {
    pub fn imports_type(&self, type_name: &str) -> bool {
        self.imports.iter().any(|t| t == type_name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// A declared instance variable: name and value type.
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    pub data_type: DataType,
}
