/// State of a node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeInstanceState {
    Active,
    Completed,
}

/// Execution-time representative of a definition node within one
/// process instance.
///
/// A milestone node instance stays active while its constraint
/// registration is live; it holds no thread or stack while waiting, it
/// is pure state until the next evaluation trigger.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    id: u64,
    node_id: String,
    state: NodeInstanceState,
}

impl NodeInstance {
    pub(crate) fn new(id: u64, node_id: String) -> Self {
        NodeInstance {
            id,
            node_id,
            state: NodeInstanceState::Active,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn state(&self) -> NodeInstanceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == NodeInstanceState::Active
    }

    pub(crate) fn complete(&mut self) {
        self.state = NodeInstanceState::Completed;
    }
}
