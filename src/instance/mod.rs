//! Execution-time state: process instances, their node instances, and
//! per-instance variable scopes.

mod node;
mod process;
mod variables;

pub use node::{NodeInstance, NodeInstanceState};
pub use process::{InstanceState, ProcessInstance, ProcessInstanceId};
pub use variables::VariableScope;
