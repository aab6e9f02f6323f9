//! Facts and the shared fact store.
//!
//! Facts are externally asserted domain objects with no inherent owner:
//! a single fact may satisfy constraints of zero, one, or many process
//! instances independently. The store is owned by the session and only
//! ever mutated through it.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::EngineError;
use crate::value::DataValue;

/// An asserted domain object: a type name plus named fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Fact {
    type_name: String,
    fields: HashMap<String, DataValue>,
}

impl Fact {
    pub fn new(type_name: impl Into<String>) -> Self {
        Fact {
            type_name: type_name.into(),
            fields: HashMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Build a fact from a JSON object; non-object values yield a fact
    /// with no fields.
    pub fn from_object(type_name: impl Into<String>, value: &Value) -> Self {
        let fields = match value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), DataValue::from_value(v)))
                .collect(),
            _ => HashMap::new(),
        };
        Fact {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&DataValue> {
        self.fields.get(name)
    }
}

/// Handle returned on insertion; the fact can later be updated through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactHandle(u64);

impl FactHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Insertion-ordered store of facts shared by every process instance.
///
/// Inserting or updating a fact never triggers evaluation by itself;
/// satisfaction is only detected at the session's explicit evaluate step.
#[derive(Debug, Default)]
pub struct FactStore {
    facts: Vec<(FactHandle, Fact)>,
    next_handle: u64,
}

impl FactStore {
    pub fn new() -> Self {
        FactStore::default()
    }

    pub fn insert(&mut self, fact: Fact) -> FactHandle {
        let handle = FactHandle(self.next_handle);
        self.next_handle += 1;
        self.facts.push((handle, fact));
        handle
    }

    /// Replace the fact behind a handle, keeping its insertion position.
    pub fn update(&mut self, handle: FactHandle, fact: Fact) -> Result<(), EngineError> {
        match self.facts.iter_mut().find(|(h, _)| *h == handle) {
            Some((_, slot)) => {
                *slot = fact;
                Ok(())
            }
            None => Err(EngineError::FactNotFound(handle.id())),
        }
    }

    pub fn get(&self, handle: FactHandle) -> Option<&Fact> {
        self.facts
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, fact)| fact)
    }

    /// Facts in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter().map(|(_, fact)| fact)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}
