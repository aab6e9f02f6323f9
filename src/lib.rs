//! # Ruleflow — a rule-gated workflow activation engine
//!
//! `ruleflow` advances instances of a declaratively defined process graph
//! by reacting to externally asserted facts. Its core mechanism is the
//! **milestone node**: a node that suspends an instance's progress until
//! an attached boolean constraint becomes satisfiable against a shared,
//! mutable fact store.
//!
//! - **Process definitions**: declarative documents (YAML / JSON) with a
//!   header (fact-type imports, variable declarations), nodes, and
//!   connections, built into an immutable graph with collected
//!   diagnostics for malformed input.
//! - **Per-instance binding**: constraints may reference "this instance's
//!   variable named X"; two instances of the same definition with
//!   different bindings evaluate independently against the same facts.
//! - **Explicit batch evaluation**: nothing fires on insertion. A single
//!   synchronous `evaluate()` call re-matches every live registration in
//!   a deterministic order and propagates completions through the graph.
//! - **Pluggable dialects**: constraint text is opaque; a dialect-keyed
//!   compiler turns it into a predicate. The built-in `condition`
//!   dialect covers comparison and membership operators with literal or
//!   variable operands.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ruleflow::{DefinitionFormat, Fact, Session};
//! use std::collections::HashMap;
//!
//! fn main() {
//!     let document = std::fs::read_to_string("process.yaml").unwrap();
//!     let mut session = Session::new();
//!     let definition = session
//!         .load_definition(&document, DefinitionFormat::Yaml)
//!         .unwrap();
//!     let instance = session.start_process(&definition, HashMap::new()).unwrap();
//!
//!     session.insert(Fact::new("Person").with("name", "John Doe"));
//!     session.evaluate();
//!     println!("{:?}", session.state(instance));
//! }
//! ```
//!
//! # Execution model
//!
//! Single-threaded and cooperative: the session owns all mutable state,
//! every operation takes `&mut self`, and the caller serializes its own
//! insert/evaluate sequence. A waiting milestone consumes no thread or
//! stack; it is pure state until the next trigger.

pub mod constraint;
pub mod dsl;
pub mod error;
pub mod facts;
pub mod graph;
pub mod instance;
pub mod session;
pub mod value;

pub use crate::constraint::{
    BindingContext, CompiledConstraint, CompilerRegistry, ConditionCompiler, ConstraintCompiler,
};
pub use crate::dsl::{parse_definition, DefinitionFormat, ProcessSchema};
pub use crate::error::{DefinitionError, EngineError, RuleError};
pub use crate::facts::{Fact, FactHandle, FactStore};
pub use crate::graph::{
    build_definition, Diagnostic, DiagnosticLevel, ProcessDefinition, ValidationReport,
};
pub use crate::instance::{InstanceState, ProcessInstanceId, VariableScope};
pub use crate::session::{EvaluationReport, InstanceFailure, MilestoneFiring, Session};
pub use crate::value::{DataType, DataValue};
