//! Structural validation of process definition documents.
//!
//! Malformed definitions are never fatal to the host: every problem is
//! collected as a diagnostic so a definition author sees all of them in
//! one pass.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::dsl::ProcessSchema;
use crate::value::DataType;

/// Severity level of a validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
    pub node_id: Option<String>,
}

/// Aggregated result of definition validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// Return only the error-level diagnostics.
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .collect()
    }

    /// Return only the warning-level diagnostics.
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .collect()
    }
}

fn error(code: &str, message: String, node_id: Option<String>) -> Diagnostic {
    Diagnostic {
        level: DiagnosticLevel::Error,
        code: code.to_string(),
        message,
        node_id,
    }
}

fn warning(code: &str, message: String, node_id: Option<String>) -> Diagnostic {
    Diagnostic {
        level: DiagnosticLevel::Warning,
        code: code.to_string(),
        message,
        node_id,
    }
}

/// Validate a parsed definition document.
///
/// Checks: node id uniqueness, known node kinds, milestone constraint
/// presence, variable declaration types, dangling connections, start/end
/// cardinality, and reachability from the start node.
pub fn validate_schema(schema: &ProcessSchema) -> ValidationReport {
    let mut diagnostics = Vec::new();

    // 1. Node ids must be unique, kinds must be known.
    let mut seen = HashSet::new();
    for node in &schema.nodes {
        if !seen.insert(node.id.as_str()) {
            diagnostics.push(error(
                "duplicate-node-id",
                format!("duplicate node id: {}", node.id),
                Some(node.id.clone()),
            ));
        }
        match node.node_type.as_str() {
            "start" | "end" => {
                if node.constraint.is_some() {
                    diagnostics.push(warning(
                        "constraint-ignored",
                        format!(
                            "node {} is a {} node; its constraint is ignored",
                            node.id, node.node_type
                        ),
                        Some(node.id.clone()),
                    ));
                }
            }
            "milestone" => {
                if node.constraint.is_none() {
                    diagnostics.push(error(
                        "missing-constraint",
                        format!("milestone node {} declares no constraint", node.id),
                        Some(node.id.clone()),
                    ));
                }
            }
            other => {
                diagnostics.push(error(
                    "unknown-node-kind",
                    format!("node {} has unknown kind '{}'", node.id, other),
                    Some(node.id.clone()),
                ));
            }
        }
    }

    // 2. Variable declarations must use known type names.
    for decl in &schema.header.variables {
        if let Some(t) = &decl.var_type {
            if DataType::from_decl(t).is_none() {
                diagnostics.push(error(
                    "unknown-variable-type",
                    format!("variable '{}' declares unknown type '{}'", decl.name, t),
                    None,
                ));
            }
        }
    }

    // 3. Connections must reference existing nodes.
    let ids: HashSet<&str> = schema.nodes.iter().map(|n| n.id.as_str()).collect();
    for conn in &schema.connections {
        for endpoint in [&conn.from, &conn.to] {
            if !ids.contains(endpoint.as_str()) {
                diagnostics.push(error(
                    "dangling-connection",
                    format!(
                        "connection {} -> {} references unknown node {}",
                        conn.from, conn.to, endpoint
                    ),
                    Some(endpoint.clone()),
                ));
            }
        }
    }

    // 4. Exactly one start, at least one end.
    let starts: Vec<&str> = schema
        .nodes
        .iter()
        .filter(|n| n.node_type == "start")
        .map(|n| n.id.as_str())
        .collect();
    if starts.is_empty() {
        diagnostics.push(error(
            "no-start-node",
            "definition has no start node".into(),
            None,
        ));
    } else if starts.len() > 1 {
        diagnostics.push(error(
            "multiple-start-nodes",
            format!("definition has {} start nodes", starts.len()),
            None,
        ));
    }
    if !schema.nodes.iter().any(|n| n.node_type == "end") {
        diagnostics.push(error(
            "no-end-node",
            "definition has no end node".into(),
            None,
        ));
    }

    // 5. Every node must be reachable from the start node. Only
    //    meaningful once a single start exists and no connection dangles.
    if starts.len() == 1
        && !diagnostics
            .iter()
            .any(|d| d.code == "dangling-connection" || d.code == "duplicate-node-id")
    {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for conn in &schema.connections {
            adjacency
                .entry(conn.from.as_str())
                .or_default()
                .push(conn.to.as_str());
        }
        let mut reached = HashSet::new();
        let mut stack = vec![starts[0]];
        while let Some(current) = stack.pop() {
            if !reached.insert(current) {
                continue;
            }
            if let Some(next) = adjacency.get(current) {
                stack.extend(next.iter().copied());
            }
        }
        for node in &schema.nodes {
            if !reached.contains(node.id.as_str()) {
                diagnostics.push(error(
                    "unreachable-node",
                    format!("node {} is not reachable from the start node", node.id),
                    Some(node.id.clone()),
                ));
            }
        }
    }

    let is_valid = !diagnostics
        .iter()
        .any(|d| d.level == DiagnosticLevel::Error);
    ValidationReport {
        is_valid,
        diagnostics,
    }
}
