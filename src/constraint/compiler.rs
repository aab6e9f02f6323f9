use std::collections::HashMap;

use crate::error::RuleError;
use crate::facts::Fact;
use crate::graph::ConstraintSource;
use crate::instance::{ProcessInstanceId, VariableScope};
use crate::value::DataValue;

/// Evaluation context bound to exactly one process instance.
///
/// Every predicate invocation carries this context instead of consulting
/// any ambient state; it is what keeps two registrations with identical
/// text from bleeding into each other across instances.
pub struct BindingContext<'a> {
    instance_id: ProcessInstanceId,
    variables: &'a VariableScope,
}

impl<'a> BindingContext<'a> {
    pub fn new(instance_id: ProcessInstanceId, variables: &'a VariableScope) -> Self {
        BindingContext {
            instance_id,
            variables,
        }
    }

    pub fn instance_id(&self) -> ProcessInstanceId {
        self.instance_id
    }

    /// Resolve an instance variable; a miss is an evaluation failure
    /// that aborts only the owning instance.
    pub fn variable(&self, name: &str) -> Result<&DataValue, RuleError> {
        self.variables.get(name)
    }

    pub fn variables(&self) -> &VariableScope {
        self.variables
    }
}

/// A compiled milestone constraint.
///
/// Implementations pattern-match one fact type and may dereference
/// instance variables through the bound context at evaluation time.
pub trait CompiledConstraint {
    /// Fact type this constraint pattern-matches against.
    fn fact_type(&self) -> &str;

    /// Names of the instance variables the constraint dereferences.
    /// Used at registration time to resolve the binding eagerly.
    fn referenced_variables(&self) -> Vec<String>;

    /// Whether the candidate fact satisfies the constraint under the
    /// given binding.
    fn matches(&self, fact: &Fact, ctx: &BindingContext<'_>) -> Result<bool, RuleError>;
}

/// Compiles constraint text of one dialect into predicates.
pub trait ConstraintCompiler {
    fn dialect(&self) -> &str;

    fn compile(&self, text: &str) -> Result<Box<dyn CompiledConstraint>, RuleError>;
}

/// Dialect-keyed compiler registry.
pub struct CompilerRegistry {
    compilers: HashMap<String, Box<dyn ConstraintCompiler>>,
}

impl CompilerRegistry {
    /// An empty registry with no dialects.
    pub fn new() -> Self {
        CompilerRegistry {
            compilers: HashMap::new(),
        }
    }

    /// Registry with the built-in `condition` dialect.
    pub fn with_builtins() -> Self {
        let mut registry = CompilerRegistry::new();
        registry.register(Box::new(super::condition::ConditionCompiler));
        registry
    }

    /// Register a compiler, replacing any previous one for its dialect.
    pub fn register(&mut self, compiler: Box<dyn ConstraintCompiler>) {
        self.compilers.insert(compiler.dialect().to_string(), compiler);
    }

    pub fn compile(
        &self,
        source: &ConstraintSource,
    ) -> Result<Box<dyn CompiledConstraint>, RuleError> {
        let compiler = self
            .compilers
            .get(&source.dialect)
            .ok_or_else(|| RuleError::UnknownDialect(source.dialect.clone()))?;
        compiler.compile(&source.text)
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
