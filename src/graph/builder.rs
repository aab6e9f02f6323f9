use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::dsl::ProcessSchema;
use crate::error::DefinitionError;
use crate::value::DataType;

use super::types::*;
use super::validator::{validate_schema, Diagnostic, DiagnosticLevel, ValidationReport};

/// Process definition - immutable graph built from a parsed document
#[derive(Debug)]
pub struct ProcessDefinition {
    /// Definition id (from the document)
    pub id: String,

    /// Display name
    pub name: String,

    /// Graph structure
    graph: StableDiGraph<ProcessNode, Connection>,

    /// Start node index
    start_idx: NodeIndex,

    /// Node id to NodeIndex mapping
    node_index_map: HashMap<String, NodeIndex>,

    /// Header metadata (imports, variable declarations)
    pub header: ProcessHeader,
}

impl ProcessDefinition {
    /// Look up a node by its document id.
    pub fn node(&self, node_id: &str) -> Option<&ProcessNode> {
        self.node_index_map
            .get(node_id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    /// Start node id.
    pub fn start_node_id(&self) -> &str {
        self.graph
            .node_weight(self.start_idx)
            .map(|n| n.id.as_str())
            .unwrap_or_default()
    }

    /// Successor nodes of a node, in connection declaration order.
    pub fn successors(&self, node_id: &str) -> Vec<&ProcessNode> {
        let Some(idx) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(*idx, petgraph::Direction::Outgoing)
            .collect();
        edges.sort_by_key(|e| e.id().index());
        edges
            .iter()
            .filter_map(|e| self.graph.node_weight(e.target()))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Build an immutable process definition from a parsed document.
///
/// Structural problems are collected into the returned
/// [`DefinitionError::Invalid`] report rather than failing one at a time.
pub fn build_definition(schema: &ProcessSchema) -> Result<ProcessDefinition, DefinitionError> {
    let report = validate_schema(schema);
    if !report.is_valid {
        return Err(DefinitionError::Invalid(Box::new(report)));
    }

    let mut graph = StableDiGraph::<ProcessNode, Connection>::new();
    let mut node_index_map: HashMap<String, NodeIndex> = HashMap::new();

    // 1. Add all nodes. Kinds were validated above.
    for node_schema in &schema.nodes {
        let kind = match node_schema.node_type.as_str() {
            "start" => NodeKind::Start,
            "end" => NodeKind::End,
            _ => {
                let constraint = node_schema.constraint.as_ref().map(|c| ConstraintSource {
                    dialect: c.dialect.clone(),
                    text: c.text.clone(),
                });
                match constraint {
                    Some(constraint) => NodeKind::Milestone { constraint },
                    None => {
                        return Err(DefinitionError::Invalid(Box::new(single_error(
                            "missing-constraint",
                            format!("milestone node {} declares no constraint", node_schema.id),
                            Some(node_schema.id.clone()),
                        ))))
                    }
                }
            }
        };
        let process_node = ProcessNode {
            id: node_schema.id.clone(),
            name: if node_schema.name.is_empty() {
                node_schema.id.clone()
            } else {
                node_schema.name.clone()
            },
            kind,
        };
        let idx = graph.add_node(process_node);
        node_index_map.insert(node_schema.id.clone(), idx);
    }

    // 2. Add all connections. Endpoints were validated above.
    for conn in &schema.connections {
        let (Some(from_idx), Some(to_idx)) = (
            node_index_map.get(&conn.from),
            node_index_map.get(&conn.to),
        ) else {
            continue;
        };
        graph.add_edge(
            *from_idx,
            *to_idx,
            Connection {
                from: conn.from.clone(),
                to: conn.to.clone(),
            },
        );
    }

    // 3. Cycles would make flow propagation non-terminating.
    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(DefinitionError::Invalid(Box::new(single_error(
            "cycle-detected",
            "definition graph contains a cycle".into(),
            None,
        ))));
    }

    // 4. Find the start node. Cardinality was validated above.
    let start_idx = schema
        .nodes
        .iter()
        .find(|n| n.node_type == "start")
        .and_then(|n| node_index_map.get(&n.id))
        .copied()
        .ok_or_else(|| {
            DefinitionError::Invalid(Box::new(single_error(
                "no-start-node",
                "definition has no start node".into(),
                None,
            )))
        })?;

    // 5. Header metadata. Type names were validated above; a missing
    //    declaration defaults to any.
    let header = ProcessHeader {
        imports: schema.header.imports.clone(),
        variables: schema
            .header
            .variables
            .iter()
            .map(|decl| VariableDeclaration {
                name: decl.name.clone(),
                data_type: decl
                    .var_type
                    .as_deref()
                    .and_then(DataType::from_decl)
                    .unwrap_or(DataType::Any),
            })
            .collect(),
    };

    Ok(ProcessDefinition {
        id: schema.id.clone(),
        name: if schema.name.is_empty() {
            schema.id.clone()
        } else {
            schema.name.clone()
        },
        graph,
        start_idx,
        node_index_map,
        header,
    })
}

fn single_error(code: &str, message: String, node_id: Option<String>) -> ValidationReport {
    ValidationReport {
        is_valid: false,
        diagnostics: vec![Diagnostic {
            level: DiagnosticLevel::Error,
            code: code.to_string(),
            message,
            node_id,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{parse_definition, DefinitionFormat};

    fn milestone_flow() -> ProcessSchema {
        let yaml = r#"
id: org.ruleflow.milestone
name: flow
header:
  imports:
    - Person
  variables:
    - name: name
      type: string
nodes:
  - id: "1"
    type: start
    name: Start
  - id: "2"
    type: milestone
    name: Milestone
    constraint:
      text: '{"fact_type":"Person","conditions":[]}'
  - id: "3"
    type: end
    name: End
connections:
  - from: "1"
    to: "2"
  - from: "2"
    to: "3"
"#;
        parse_definition(yaml, DefinitionFormat::Yaml).unwrap()
    }

    #[test]
    fn test_build_milestone_flow() {
        let def = build_definition(&milestone_flow()).unwrap();
        assert_eq!(def.id, "org.ruleflow.milestone");
        assert_eq!(def.name, "flow");
        assert_eq!(def.start_node_id(), "1");
        assert_eq!(def.node_count(), 3);
        assert!(matches!(def.node("2").unwrap().kind, NodeKind::Milestone { .. }));
        assert!(def.header.imports_type("Person"));
        assert_eq!(
            def.header.variable("name").unwrap().data_type,
            DataType::String
        );
    }

    #[test]
    fn test_successor_order() {
        let def = build_definition(&milestone_flow()).unwrap();
        let successors = def.successors("1");
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].id, "2");
        assert!(def.successors("3").is_empty());
        assert!(def.successors("missing").is_empty());
    }

    #[test]
    fn test_build_rejects_invalid_schema() {
        let mut schema = milestone_flow();
        schema.connections.push(crate::dsl::ConnectionSchema {
            from: "3".into(),
            to: "missing".into(),
        });
        let err = build_definition(&schema).unwrap_err();
        let report = err.report().unwrap();
        assert!(report
            .errors()
            .iter()
            .any(|d| d.code == "dangling-connection"));
    }

    #[test]
    fn test_build_rejects_cycle() {
        let mut schema = milestone_flow();
        schema.connections.push(crate::dsl::ConnectionSchema {
            from: "3".into(),
            to: "2".into(),
        });
        let err = build_definition(&schema).unwrap_err();
        let report = err.report().unwrap();
        assert!(report.errors().iter().any(|d| d.code == "cycle-detected"));
    }

    #[test]
    fn test_default_name_and_variable_type() {
        let yaml = r#"
id: flow
header:
  variables:
    - name: anything
nodes:
  - id: s
    type: start
  - id: e
    type: end
connections:
  - from: s
    to: e
"#;
        let schema = parse_definition(yaml, DefinitionFormat::Yaml).unwrap();
        let def = build_definition(&schema).unwrap();
        assert_eq!(def.name, "flow");
        assert_eq!(def.node("s").unwrap().name, "s");
        assert_eq!(
            def.header.variable("anything").unwrap().data_type,
            DataType::Any
        );
    }
}
