use std::collections::HashMap;

use crate::error::RuleError;
use crate::value::DataValue;

/// Per-instance variable scope.
///
/// Seeded from start parameters when the instance is created; values are
/// immutable afterwards. Constraints that mention instance variables
/// resolve them here through their bound context, which is what keeps
/// textually identical constraints apart across instances.
#[derive(Debug, Clone, Default)]
pub struct VariableScope {
    values: HashMap<String, DataValue>,
}

impl VariableScope {
    pub fn new() -> Self {
        VariableScope::default()
    }

    pub(crate) fn seed(&mut self, name: String, value: DataValue) {
        self.values.insert(name, value);
    }

    /// Look up a variable. No implicit default: a miss is an error the
    /// caller propagates.
    pub fn get(&self, name: &str) -> Result<&DataValue, RuleError> {
        self.values
            .get(name)
            .ok_or_else(|| RuleError::UnknownVariable(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
