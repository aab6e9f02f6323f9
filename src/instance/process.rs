use std::sync::Arc;

use crate::error::EngineError;
use crate::graph::ProcessDefinition;

use super::node::{NodeInstance, NodeInstanceState};
use super::variables::VariableScope;

/// Session-scoped process instance id.
pub type ProcessInstanceId = u64;

/// State of a process instance. Completed and Aborted are terminal:
/// once reached, no further mutation is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Active,
    Completed,
    Aborted,
}

impl InstanceState {
    pub fn is_active(&self) -> bool {
        matches!(self, InstanceState::Active)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceState::Active => "active",
            InstanceState::Completed => "completed",
            InstanceState::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

/// One running execution of a process definition.
///
/// Owns its state, variable scope, and node instances. All mutation goes
/// through node-instance transitions; a terminal instance rejects every
/// further transition so a delayed firing can never resurrect it.
#[derive(Debug)]
pub struct ProcessInstance {
    id: ProcessInstanceId,
    definition: Arc<ProcessDefinition>,
    state: InstanceState,
    variables: VariableScope,
    node_instances: Vec<NodeInstance>,
    next_node_instance: u64,
    abort_cause: Option<String>,
}

impl ProcessInstance {
    pub(crate) fn new(
        id: ProcessInstanceId,
        definition: Arc<ProcessDefinition>,
        variables: VariableScope,
    ) -> Self {
        ProcessInstance {
            id,
            definition,
            state: InstanceState::Active,
            variables,
            node_instances: Vec::new(),
            next_node_instance: 0,
            abort_cause: None,
        }
    }

    pub fn id(&self) -> ProcessInstanceId {
        self.id
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    pub fn definition(&self) -> &Arc<ProcessDefinition> {
        &self.definition
    }

    pub fn variables(&self) -> &VariableScope {
        &self.variables
    }

    /// Why the instance aborted, when a cause was recorded.
    pub fn abort_cause(&self) -> Option<&str> {
        self.abort_cause.as_deref()
    }

    /// Number of node instances still active.
    pub fn active_nodes(&self) -> usize {
        self.node_instances
            .iter()
            .filter(|ni| ni.is_active())
            .count()
    }

    pub(crate) fn node_instance(&self, node_instance_id: u64) -> Option<&NodeInstance> {
        self.node_instances
            .iter()
            .find(|ni| ni.id() == node_instance_id)
    }

    fn guard_active(&self) -> Result<(), EngineError> {
        if self.state.is_terminal() {
            return Err(EngineError::InvalidTransition {
                instance_id: self.id,
                reason: format!("instance is already {}", self.state),
            });
        }
        Ok(())
    }

    /// Create an active node instance for a definition node.
    pub(crate) fn activate_node(&mut self, node_id: &str) -> Result<u64, EngineError> {
        self.guard_active()?;
        let id = self.next_node_instance;
        self.next_node_instance += 1;
        self.node_instances.push(NodeInstance::new(id, node_id.to_string()));
        Ok(id)
    }

    pub(crate) fn complete_node(&mut self, node_instance_id: u64) -> Result<(), EngineError> {
        self.guard_active()?;
        let instance_id = self.id;
        let node = self
            .node_instances
            .iter_mut()
            .find(|ni| ni.id() == node_instance_id)
            .ok_or_else(|| {
                EngineError::Internal(format!(
                    "node instance {} not found on process instance {}",
                    node_instance_id, instance_id
                ))
            })?;
        if node.state() != NodeInstanceState::Active {
            return Err(EngineError::InvalidTransition {
                instance_id,
                reason: format!("node instance {} is already completed", node_instance_id),
            });
        }
        node.complete();
        Ok(())
    }

    pub(crate) fn complete(&mut self) -> Result<(), EngineError> {
        self.guard_active()?;
        self.state = InstanceState::Completed;
        Ok(())
    }

    pub(crate) fn abort(&mut self, cause: Option<String>) -> Result<(), EngineError> {
        self.guard_active()?;
        self.state = InstanceState::Aborted;
        self.abort_cause = cause;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{parse_definition, DefinitionFormat};
    use crate::graph::build_definition;

    fn definition() -> Arc<ProcessDefinition> {
        let yaml = r#"
id: flow
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
        Arc::new(build_definition(&schema).unwrap())
    }

    fn instance() -> ProcessInstance {
        ProcessInstance::new(1, definition(), VariableScope::new())
    }

    #[test]
    fn test_new_instance_is_active() {
        let instance = instance();
        assert_eq!(instance.id(), 1);
        assert!(instance.state().is_active());
        assert_eq!(instance.active_nodes(), 0);
        assert!(instance.abort_cause().is_none());
    }

    #[test]
    fn test_node_lifecycle() {
        let mut instance = instance();
        let ni = instance.activate_node("s").unwrap();
        assert_eq!(instance.active_nodes(), 1);
        instance.complete_node(ni).unwrap();
        assert_eq!(instance.active_nodes(), 0);
        assert!(!instance.node_instance(ni).unwrap().is_active());
    }

    #[test]
    fn test_complete_node_twice() {
        let mut instance = instance();
        let ni = instance.activate_node("s").unwrap();
        instance.complete_node(ni).unwrap();
        assert!(matches!(
            instance.complete_node(ni),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_terminal_state_is_frozen() {
        let mut instance = instance();
        instance.complete().unwrap();
        assert_eq!(instance.state(), InstanceState::Completed);
        assert!(matches!(
            instance.activate_node("s"),
            Err(EngineError::InvalidTransition { .. })
        ));
        assert!(matches!(
            instance.complete(),
            Err(EngineError::InvalidTransition { .. })
        ));
        assert!(matches!(
            instance.abort(None),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_abort_records_cause() {
        let mut instance = instance();
        instance.abort(Some("unknown variable: name".into())).unwrap();
        assert_eq!(instance.state(), InstanceState::Aborted);
        assert_eq!(instance.abort_cause(), Some("unknown variable: name"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(InstanceState::Active.to_string(), "active");
        assert_eq!(InstanceState::Completed.to_string(), "completed");
        assert_eq!(InstanceState::Aborted.to_string(), "aborted");
    }
}
