//! Constraint compilation and evaluation.
//!
//! The engine never inspects constraint text. A dialect-keyed compiler
//! turns text into an opaque predicate; the engine only invokes it with
//! a candidate fact and the bound context of the owning instance.

mod compiler;
mod condition;

pub use compiler::{BindingContext, CompiledConstraint, CompilerRegistry, ConstraintCompiler};
pub use condition::ConditionCompiler;
