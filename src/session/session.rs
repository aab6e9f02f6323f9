use std::collections::HashMap;
use std::sync::Arc;

use crate::constraint::{BindingContext, CompilerRegistry, ConstraintCompiler};
use crate::dsl::{parse_definition, DefinitionFormat, ProcessSchema};
use crate::error::{DefinitionError, EngineError, RuleError};
use crate::facts::{Fact, FactHandle, FactStore};
use crate::graph::{build_definition, ConstraintSource, NodeKind, ProcessDefinition};
use crate::instance::{InstanceState, ProcessInstance, ProcessInstanceId, VariableScope};
use crate::value::DataValue;

use super::registration::{ConstraintRegistration, RegistrationId, RegistrationIndex};

/// One milestone completion produced by an evaluation trigger.
#[derive(Debug, Clone)]
pub struct MilestoneFiring {
    pub instance_id: ProcessInstanceId,
    pub node_id: String,
}

/// A per-instance failure produced by an evaluation trigger. The failing
/// instance was aborted; the batch continued.
#[derive(Debug, Clone)]
pub struct InstanceFailure {
    pub instance_id: ProcessInstanceId,
    pub error: RuleError,
}

/// Outcome of one `evaluate()` call.
#[derive(Debug, Default)]
pub struct EvaluationReport {
    /// Milestone completions, in firing order.
    pub fired: Vec<MilestoneFiring>,
    /// Instances aborted by constraint evaluation failures.
    pub failures: Vec<InstanceFailure>,
}

impl EvaluationReport {
    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    pub fn is_quiet(&self) -> bool {
        self.fired.is_empty() && self.failures.is_empty()
    }
}

enum MatchOutcome {
    Satisfied,
    Failed(RuleError),
}

/// The session owns every piece of mutable runtime state: registered
/// definitions, process instances, the shared fact store, and the live
/// constraint registrations.
///
/// All operations are synchronous and take `&mut self`; the caller
/// drives a single evaluation loop and serializes its own insert and
/// evaluate steps. Nothing here fires implicitly: satisfaction is only
/// detected inside [`Session::evaluate`].
#[derive(Default)]
pub struct Session {
    definitions: HashMap<String, Arc<ProcessDefinition>>,
    compilers: CompilerRegistry,
    instances: HashMap<ProcessInstanceId, ProcessInstance>,
    facts: FactStore,
    registrations: RegistrationIndex,
    next_instance_id: ProcessInstanceId,
}

impl Session {
    /// A session with the built-in constraint dialects.
    pub fn new() -> Self {
        Session::default()
    }

    /// Register an additional constraint dialect.
    pub fn register_compiler(&mut self, compiler: Box<dyn ConstraintCompiler>) {
        self.compilers.register(compiler);
    }

    /// Build and register a definition from a parsed document.
    pub fn register_definition(&mut self, schema: &ProcessSchema) -> Result<String, DefinitionError> {
        let definition = build_definition(schema)?;
        if self.definitions.contains_key(&definition.id) {
            return Err(DefinitionError::Duplicate(definition.id));
        }
        let id = definition.id.clone();
        self.definitions.insert(id.clone(), Arc::new(definition));
        Ok(id)
    }

    /// Parse, build, and register a definition document in one step.
    pub fn load_definition(
        &mut self,
        content: &str,
        format: DefinitionFormat,
    ) -> Result<String, DefinitionError> {
        let schema = parse_definition(content, format)?;
        self.register_definition(&schema)
    }

    /// Start a process instance, seeding its variable scope from the
    /// given parameters.
    ///
    /// The returned id is valid even when initial propagation aborts the
    /// instance (for example a milestone whose constraint fails to
    /// register); the caller observes that through [`Session::state`]
    /// and [`Session::abort_cause`].
    pub fn start_process(
        &mut self,
        definition_id: &str,
        params: HashMap<String, DataValue>,
    ) -> Result<ProcessInstanceId, EngineError> {
        let definition = self
            .definitions
            .get(definition_id)
            .cloned()
            .ok_or_else(|| EngineError::DefinitionNotFound(definition_id.to_string()))?;

        let mut variables = VariableScope::new();
        for (name, value) in params {
            let Some(decl) = definition.header.variable(&name) else {
                return Err(EngineError::UndeclaredVariable { name });
            };
            if !value.matches_type(&decl.data_type) {
                return Err(EngineError::TypeMismatch {
                    name,
                    expected: decl.data_type.name().to_string(),
                });
            }
            variables.seed(name, value);
        }

        let id = self.next_instance_id;
        self.next_instance_id += 1;
        self.instances
            .insert(id, ProcessInstance::new(id, definition.clone(), variables));
        tracing::debug!(instance = id, definition = %definition.id, "process instance started");

        let start_node = definition.start_node_id().to_string();
        self.activate_node(id, &start_node)?;
        Ok(id)
    }

    /// Current state of an instance. Pure query.
    pub fn state(&self, instance_id: ProcessInstanceId) -> Result<InstanceState, EngineError> {
        Ok(self.instance(instance_id)?.state())
    }

    /// Why an instance aborted, when the engine recorded a cause.
    pub fn abort_cause(&self, instance_id: ProcessInstanceId) -> Result<Option<&str>, EngineError> {
        Ok(self.instance(instance_id)?.abort_cause())
    }

    /// Append a fact to the shared store. Does not trigger evaluation.
    pub fn insert(&mut self, fact: Fact) -> FactHandle {
        self.facts.insert(fact)
    }

    /// Replace a fact behind its handle. Does not trigger evaluation.
    pub fn update(&mut self, handle: FactHandle, fact: Fact) -> Result<(), EngineError> {
        self.facts.update(handle, fact)
    }

    /// Abort an instance, deregistering all of its live constraint
    /// registrations atomically with the state transition.
    pub fn abort(&mut self, instance_id: ProcessInstanceId) -> Result<(), EngineError> {
        self.instance_mut(instance_id)?.abort(None)?;
        self.registrations.deregister_instance(instance_id);
        tracing::debug!(instance = instance_id, "process instance aborted");
        Ok(())
    }

    /// Run the batch match-and-fire trigger.
    ///
    /// Every live registration is re-matched against the current fact
    /// population, in registration insertion order. Registrations
    /// created by flow propagation during the call are matched before it
    /// returns: passes repeat until one fires nothing. Failures abort
    /// only the owning instance; the batch always runs to completion.
    pub fn evaluate(&mut self) -> EvaluationReport {
        let mut report = EvaluationReport::default();
        loop {
            let outcomes = self.match_pass();
            if outcomes.is_empty() {
                break;
            }
            for (seq, outcome) in outcomes {
                // A terminal transition earlier in this pass may already
                // have removed the registration.
                let Some(registration) = self.registrations.deregister(seq) else {
                    continue;
                };
                match outcome {
                    MatchOutcome::Satisfied => {
                        tracing::debug!(
                            instance = registration.instance_id,
                            node = %registration.node_id,
                            "milestone constraint satisfied"
                        );
                        report.fired.push(MilestoneFiring {
                            instance_id: registration.instance_id,
                            node_id: registration.node_id.clone(),
                        });
                        if let Err(err) = self.fire(&registration) {
                            tracing::warn!(
                                instance = registration.instance_id,
                                error = %err,
                                "milestone completion failed; aborting instance"
                            );
                            self.abort_instance(registration.instance_id, err.to_string());
                        }
                    }
                    MatchOutcome::Failed(err) => {
                        tracing::warn!(
                            instance = registration.instance_id,
                            node = %registration.node_id,
                            error = %err,
                            "constraint evaluation failed; aborting instance"
                        );
                        report.failures.push(InstanceFailure {
                            instance_id: registration.instance_id,
                            error: err.clone(),
                        });
                        self.abort_instance(registration.instance_id, err.to_string());
                    }
                }
            }
        }
        report
    }

    /// Number of facts currently asserted.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of live milestone constraint registrations.
    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    // ================================
    // Internal: activation protocol
    // ================================

    fn instance(&self, instance_id: ProcessInstanceId) -> Result<&ProcessInstance, EngineError> {
        self.instances
            .get(&instance_id)
            .ok_or(EngineError::InstanceNotFound(instance_id))
    }

    fn instance_mut(
        &mut self,
        instance_id: ProcessInstanceId,
    ) -> Result<&mut ProcessInstance, EngineError> {
        self.instances
            .get_mut(&instance_id)
            .ok_or(EngineError::InstanceNotFound(instance_id))
    }

    /// Create and activate a node instance, dispatching on node kind.
    fn activate_node(
        &mut self,
        instance_id: ProcessInstanceId,
        node_id: &str,
    ) -> Result<(), EngineError> {
        let definition = self.instance(instance_id)?.definition().clone();
        let node = definition.node(node_id).ok_or_else(|| {
            EngineError::Internal(format!(
                "node {} not found in definition {}",
                node_id, definition.id
            ))
        })?;

        match &node.kind {
            NodeKind::Start => {
                let instance = self.instance_mut(instance_id)?;
                let node_instance = instance.activate_node(node_id)?;
                instance.complete_node(node_instance)?;
                self.propagate(instance_id, node_id)?;
            }
            NodeKind::End => {
                let completed = {
                    let instance = self.instance_mut(instance_id)?;
                    let node_instance = instance.activate_node(node_id)?;
                    instance.complete_node(node_instance)?;
                    if instance.active_nodes() == 0 {
                        instance.complete()?;
                        true
                    } else {
                        false
                    }
                };
                if completed {
                    self.registrations.deregister_instance(instance_id);
                    tracing::debug!(instance = instance_id, "process instance completed");
                }
            }
            NodeKind::Milestone { constraint } => {
                let node_instance = self.instance_mut(instance_id)?.activate_node(node_id)?;
                match self.register_milestone(instance_id, node_instance, node_id, constraint, &definition)
                {
                    Ok(seq) => {
                        tracing::debug!(
                            instance = instance_id,
                            node = node_id,
                            registration = seq,
                            "milestone constraint registered"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(
                            instance = instance_id,
                            node = node_id,
                            error = %err,
                            "milestone registration failed; aborting instance"
                        );
                        self.abort_instance(instance_id, err.to_string());
                    }
                }
            }
        }
        Ok(())
    }

    /// Propagate flow along every outgoing connection of a completed
    /// node. Stops early when the instance reaches a terminal state.
    fn propagate(
        &mut self,
        instance_id: ProcessInstanceId,
        from_node_id: &str,
    ) -> Result<(), EngineError> {
        let definition = self.instance(instance_id)?.definition().clone();
        let targets: Vec<String> = definition
            .successors(from_node_id)
            .iter()
            .map(|n| n.id.clone())
            .collect();
        for target in targets {
            if self.instance(instance_id)?.state().is_terminal() {
                break;
            }
            self.activate_node(instance_id, &target)?;
        }
        Ok(())
    }

    /// Compile a milestone constraint and register it, binding it to the
    /// owning instance. The fact type must be imported by the definition
    /// header and every referenced variable must exist in the instance's
    /// scope.
    fn register_milestone(
        &mut self,
        instance_id: ProcessInstanceId,
        node_instance_id: u64,
        node_id: &str,
        source: &ConstraintSource,
        definition: &ProcessDefinition,
    ) -> Result<RegistrationId, RuleError> {
        let compiled = self.compilers.compile(source)?;
        if !definition.header.imports_type(compiled.fact_type()) {
            return Err(RuleError::UnknownFactType(compiled.fact_type().to_string()));
        }
        let instance = self.instances.get(&instance_id).ok_or_else(|| {
            RuleError::UnresolvedBinding(format!("process instance {} not found", instance_id))
        })?;
        for var in compiled.referenced_variables() {
            if !instance.variables().has(&var) {
                return Err(RuleError::UnresolvedBinding(format!(
                    "constraint references unknown variable '{}'",
                    var
                )));
            }
        }
        Ok(self
            .registrations
            .register(instance_id, node_instance_id, node_id.to_string(), compiled))
    }

    /// Abort an instance from inside the engine, recording the cause.
    /// Tolerates instances already terminal.
    fn abort_instance(&mut self, instance_id: ProcessInstanceId, cause: String) {
        match self.instances.get_mut(&instance_id) {
            Some(instance) if instance.state().is_active() => {
                if let Err(err) = instance.abort(Some(cause)) {
                    tracing::error!(instance = instance_id, error = %err, "abort failed");
                    return;
                }
                self.registrations.deregister_instance(instance_id);
                tracing::debug!(instance = instance_id, "process instance aborted");
            }
            _ => {}
        }
    }

    /// Match every live registration against the current facts. Pure
    /// with respect to session state; outcomes are applied by the
    /// caller in registration order.
    fn match_pass(&self) -> Vec<(RegistrationId, MatchOutcome)> {
        let mut outcomes = Vec::new();
        for registration in self.registrations.iter() {
            let Some(instance) = self.instances.get(&registration.instance_id) else {
                continue;
            };
            if !instance.state().is_active() {
                continue;
            }
            let ctx = BindingContext::new(registration.instance_id, instance.variables());
            let mut outcome = None;
            for fact in self.facts.iter() {
                match registration.constraint.matches(fact, &ctx) {
                    Ok(true) => {
                        outcome = Some(MatchOutcome::Satisfied);
                        break;
                    }
                    Ok(false) => {}
                    Err(err) => {
                        outcome = Some(MatchOutcome::Failed(err));
                        break;
                    }
                }
            }
            if let Some(outcome) = outcome {
                outcomes.push((registration.seq, outcome));
            }
        }
        outcomes
    }

    /// Complete a fired milestone's node instance and propagate flow
    /// from it. The registration was already removed from the index.
    fn fire(&mut self, registration: &ConstraintRegistration) -> Result<(), EngineError> {
        self.instance_mut(registration.instance_id)?
            .complete_node(registration.node_instance_id)?;
        self.propagate(registration.instance_id, &registration.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Fact;
    use crate::instance::InstanceState;

    const LITERAL_FLOW: &str = r#"
id: org.ruleflow.milestone
name: flow
header:
  imports:
    - Person
nodes:
  - id: "1"
    type: start
    name: Start
  - id: "2"
    type: milestone
    name: Milestone
    constraint:
      dialect: condition
      text: '{"fact_type":"Person","conditions":[{"field":"name","op":"eq","value":"John Doe"}]}'
  - id: "3"
    type: end
    name: End
connections:
  - from: "1"
    to: "2"
  - from: "2"
    to: "3"
"#;

    const BOUND_FLOW: &str = r#"
id: org.ruleflow.milestone.bound
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
      dialect: condition
      text: '{"fact_type":"Person","conditions":[{"field":"name","op":"eq","value":{"var":"name"}}]}'
  - id: "3"
    type: end
    name: End
connections:
  - from: "1"
    to: "2"
  - from: "2"
    to: "3"
"#;

    fn session_with(flow: &str) -> (Session, String) {
        let mut session = Session::new();
        let id = session
            .load_definition(flow, DefinitionFormat::Yaml)
            .unwrap();
        (session, id)
    }

    fn params(name: &str) -> HashMap<String, DataValue> {
        HashMap::from([("name".to_string(), DataValue::from(name))])
    }

    fn person(name: &str, age: i64) -> Fact {
        Fact::new("Person").with("name", name).with("age", age)
    }

    #[test]
    fn test_milestone_gates_until_fact_matches() {
        let (mut session, def) = session_with(LITERAL_FLOW);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Active);
        assert_eq!(session.registration_count(), 1);

        session.insert(person("Jane Doe", 20));
        let report = session.evaluate();
        assert!(report.is_quiet());
        assert_eq!(session.state(instance).unwrap(), InstanceState::Active);

        session.insert(person("John Doe", 50));
        let report = session.evaluate();
        assert_eq!(report.fired_count(), 1);
        assert_eq!(report.fired[0].node_id, "2");
        assert_eq!(session.state(instance).unwrap(), InstanceState::Completed);
        assert_eq!(session.registration_count(), 0);
    }

    #[test]
    fn test_instances_isolated_by_variable_binding() {
        let (mut session, def) = session_with(BOUND_FLOW);
        let john = session.start_process(&def, params("John Doe")).unwrap();
        let jane = session.start_process(&def, params("Jane Doe")).unwrap();
        assert_eq!(session.state(john).unwrap(), InstanceState::Active);
        assert_eq!(session.state(jane).unwrap(), InstanceState::Active);

        session.insert(person("Jane Doe", 20));
        let report = session.evaluate();
        assert_eq!(report.fired_count(), 1);
        assert_eq!(report.fired[0].instance_id, jane);
        assert_eq!(session.state(john).unwrap(), InstanceState::Active);
        assert_eq!(session.state(jane).unwrap(), InstanceState::Completed);

        session.insert(person("John Doe", 20));
        let report = session.evaluate();
        assert_eq!(report.fired_count(), 1);
        assert_eq!(report.fired[0].instance_id, john);
        assert_eq!(session.state(john).unwrap(), InstanceState::Completed);
        assert_eq!(session.state(jane).unwrap(), InstanceState::Completed);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let (mut session, def) = session_with(LITERAL_FLOW);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        session.insert(person("Jane Doe", 20));

        assert!(session.evaluate().is_quiet());
        assert!(session.evaluate().is_quiet());
        assert_eq!(session.state(instance).unwrap(), InstanceState::Active);
        assert_eq!(session.registration_count(), 1);
    }

    #[test]
    fn test_terminal_instances_are_immutable() {
        let (mut session, def) = session_with(LITERAL_FLOW);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        session.insert(person("John Doe", 50));
        session.evaluate();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Completed);

        // More matching facts change nothing for the completed instance.
        session.insert(person("John Doe", 51));
        let report = session.evaluate();
        assert!(report.is_quiet());
        assert_eq!(session.state(instance).unwrap(), InstanceState::Completed);

        assert!(matches!(
            session.abort(instance),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_abort_deregisters_constraints() {
        let (mut session, def) = session_with(LITERAL_FLOW);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        assert_eq!(session.registration_count(), 1);

        session.abort(instance).unwrap();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Aborted);
        assert_eq!(session.registration_count(), 0);

        // A fact that would have satisfied the registration has no effect.
        session.insert(person("John Doe", 50));
        let report = session.evaluate();
        assert!(report.is_quiet());
        assert_eq!(session.state(instance).unwrap(), InstanceState::Aborted);
    }

    #[test]
    fn test_batch_firing_is_deterministic() {
        let run = || {
            let (mut session, def) = session_with(LITERAL_FLOW);
            let first = session.start_process(&def, HashMap::new()).unwrap();
            let second = session.start_process(&def, HashMap::new()).unwrap();
            session.insert(person("John Doe", 50));
            let report = session.evaluate();
            assert_eq!(report.fired_count(), 2);
            assert_eq!(session.state(first).unwrap(), InstanceState::Completed);
            assert_eq!(session.state(second).unwrap(), InstanceState::Completed);
            report
                .fired
                .iter()
                .map(|f| f.instance_id)
                .collect::<Vec<_>>()
        };
        let first_run = run();
        let second_run = run();
        // Registration insertion order: first instance fires first.
        assert_eq!(first_run, vec![0, 1]);
        assert_eq!(first_run, second_run);
    }

    #[test]
    fn test_chained_milestones_fire_in_one_evaluate() {
        let flow = r#"
id: chained
header:
  imports:
    - Person
    - Order
nodes:
  - id: s
    type: start
  - id: m1
    type: milestone
    constraint:
      text: '{"fact_type":"Person","conditions":[{"field":"name","op":"eq","value":"John Doe"}]}'
  - id: m2
    type: milestone
    constraint:
      text: '{"fact_type":"Order","conditions":[{"field":"total","op":"gt","value":100}]}'
  - id: e
    type: end
connections:
  - from: s
    to: m1
  - from: m1
    to: m2
  - from: m2
    to: e
"#;
        let (mut session, def) = session_with(flow);
        let instance = session.start_process(&def, HashMap::new()).unwrap();

        // Both facts present before the trigger: the second milestone is
        // registered mid-evaluation and still fires in the same call.
        session.insert(person("John Doe", 50));
        session.insert(Fact::new("Order").with("total", 250i64));
        let report = session.evaluate();
        assert_eq!(report.fired_count(), 2);
        assert_eq!(report.fired[0].node_id, "m1");
        assert_eq!(report.fired[1].node_id, "m2");
        assert_eq!(session.state(instance).unwrap(), InstanceState::Completed);
    }

    #[test]
    fn test_parallel_paths_complete_on_last_end() {
        let flow = r#"
id: parallel
header:
  imports:
    - Person
    - Order
nodes:
  - id: s
    type: start
  - id: m1
    type: milestone
    constraint:
      text: '{"fact_type":"Person","conditions":[]}'
  - id: m2
    type: milestone
    constraint:
      text: '{"fact_type":"Order","conditions":[]}'
  - id: e
    type: end
connections:
  - from: s
    to: m1
  - from: s
    to: m2
  - from: m1
    to: e
  - from: m2
    to: e
"#;
        let (mut session, def) = session_with(flow);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        assert_eq!(session.registration_count(), 2);

        session.insert(person("John Doe", 50));
        session.evaluate();
        // One path reached the end; the other milestone still gates.
        assert_eq!(session.state(instance).unwrap(), InstanceState::Active);
        assert_eq!(session.registration_count(), 1);

        session.insert(Fact::new("Order").with("total", 10i64));
        session.evaluate();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Completed);
    }

    #[test]
    fn test_unknown_dialect_aborts_instance() {
        let flow = r#"
id: dialectless
header:
  imports:
    - Person
nodes:
  - id: s
    type: start
  - id: m
    type: milestone
    constraint:
      dialect: mvel
      text: 'Person( name == "John Doe" )'
  - id: e
    type: end
connections:
  - from: s
    to: m
  - from: m
    to: e
"#;
        let (mut session, def) = session_with(flow);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Aborted);
        assert!(session
            .abort_cause(instance)
            .unwrap()
            .unwrap()
            .contains("unknown constraint dialect"));
        assert_eq!(session.registration_count(), 0);
    }

    #[test]
    fn test_unimported_fact_type_aborts_instance() {
        let flow = r#"
id: unimported
nodes:
  - id: s
    type: start
  - id: m
    type: milestone
    constraint:
      text: '{"fact_type":"Person","conditions":[]}'
  - id: e
    type: end
connections:
  - from: s
    to: m
  - from: m
    to: e
"#;
        let (mut session, def) = session_with(flow);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Aborted);
        assert!(session
            .abort_cause(instance)
            .unwrap()
            .unwrap()
            .contains("unknown fact type"));
    }

    #[test]
    fn test_unresolved_variable_binding_aborts_instance() {
        let (mut session, def) = session_with(BOUND_FLOW);
        // No "name" parameter: the constraint's binding cannot resolve.
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        assert_eq!(session.state(instance).unwrap(), InstanceState::Aborted);
        assert!(session
            .abort_cause(instance)
            .unwrap()
            .unwrap()
            .contains("unresolved constraint binding"));
    }

    #[test]
    fn test_start_parameter_validation() {
        let (mut session, def) = session_with(BOUND_FLOW);
        assert!(matches!(
            session.start_process(&def, HashMap::from([("other".to_string(), DataValue::from("x"))])),
            Err(EngineError::UndeclaredVariable { .. })
        ));
        assert!(matches!(
            session.start_process(&def, HashMap::from([("name".to_string(), DataValue::from(42i64))])),
            Err(EngineError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_update_fact_satisfies_constraint() {
        let (mut session, def) = session_with(LITERAL_FLOW);
        let instance = session.start_process(&def, HashMap::new()).unwrap();

        let handle = session.insert(person("Jane Doe", 20));
        assert!(session.evaluate().is_quiet());
        assert_eq!(session.state(instance).unwrap(), InstanceState::Active);

        session.update(handle, person("John Doe", 20)).unwrap();
        let report = session.evaluate();
        assert_eq!(report.fired_count(), 1);
        assert_eq!(session.state(instance).unwrap(), InstanceState::Completed);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut session = Session::new();
        assert!(matches!(
            session.start_process("missing", HashMap::new()),
            Err(EngineError::DefinitionNotFound(_))
        ));
        assert!(matches!(
            session.state(9),
            Err(EngineError::InstanceNotFound(9))
        ));
        assert!(matches!(
            session.abort(9),
            Err(EngineError::InstanceNotFound(9))
        ));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let (mut session, _) = session_with(LITERAL_FLOW);
        assert!(matches!(
            session.load_definition(LITERAL_FLOW, DefinitionFormat::Yaml),
            Err(DefinitionError::Duplicate(_))
        ));
    }

    #[test]
    fn test_abort_twice_is_invalid_transition() {
        let (mut session, def) = session_with(LITERAL_FLOW);
        let instance = session.start_process(&def, HashMap::new()).unwrap();
        session.abort(instance).unwrap();
        assert!(matches!(
            session.abort(instance),
            Err(EngineError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_failure_isolated_to_owning_instance() {
        struct BrokenBinding;

        impl crate::constraint::CompiledConstraint for BrokenBinding {
            fn fact_type(&self) -> &str {
                "Person"
            }

            fn referenced_variables(&self) -> Vec<String> {
                // Claims no references, so registration succeeds and the
                // miss only surfaces at evaluation time.
                Vec::new()
            }

            fn matches(
                &self,
                _fact: &Fact,
                ctx: &BindingContext<'_>,
            ) -> Result<bool, RuleError> {
                ctx.variable("missing").map(|_| true)
            }
        }

        struct BrokenCompiler;

        impl ConstraintCompiler for BrokenCompiler {
            fn dialect(&self) -> &str {
                "broken"
            }

            fn compile(
                &self,
                _text: &str,
            ) -> Result<Box<dyn crate::constraint::CompiledConstraint>, RuleError> {
                Ok(Box::new(BrokenBinding))
            }
        }

        let flow = r#"
id: broken
header:
  imports:
    - Person
nodes:
  - id: s
    type: start
  - id: m
    type: milestone
    constraint:
      dialect: broken
      text: ''
  - id: e
    type: end
connections:
  - from: s
    to: m
  - from: m
    to: e
"#;
        let mut session = Session::new();
        session.register_compiler(Box::new(BrokenCompiler));
        let broken_def = session
            .load_definition(flow, DefinitionFormat::Yaml)
            .unwrap();
        let healthy_def = session
            .load_definition(LITERAL_FLOW, DefinitionFormat::Yaml)
            .unwrap();

        let broken = session.start_process(&broken_def, HashMap::new()).unwrap();
        let healthy = session.start_process(&healthy_def, HashMap::new()).unwrap();

        session.insert(person("John Doe", 50));
        let report = session.evaluate();

        // The broken instance aborts; the healthy one still completes in
        // the same batch.
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].instance_id, broken);
        assert_eq!(
            report.failures[0].error,
            RuleError::UnknownVariable("missing".into())
        );
        assert_eq!(session.state(broken).unwrap(), InstanceState::Aborted);
        assert_eq!(session.state(healthy).unwrap(), InstanceState::Completed);
    }
}
