//! Live milestone constraint registrations.

use crate::constraint::CompiledConstraint;
use crate::instance::ProcessInstanceId;

/// Identifier of a live registration; doubles as its insertion sequence
/// number, which fixes the batch firing order.
pub type RegistrationId = u64;

/// A milestone constraint held live in the matching index until it
/// fires or its owning instance reaches a terminal state.
pub(crate) struct ConstraintRegistration {
    pub seq: RegistrationId,
    pub instance_id: ProcessInstanceId,
    pub node_instance_id: u64,
    pub node_id: String,
    pub constraint: Box<dyn CompiledConstraint>,
}

/// Insertion-ordered index of live registrations.
///
/// Iteration order is the insertion order; sequence numbers are
/// monotonic and never reused, so firing order is deterministic for a
/// given insertion history.
#[derive(Default)]
pub(crate) struct RegistrationIndex {
    live: Vec<ConstraintRegistration>,
    next_seq: RegistrationId,
}

impl RegistrationIndex {
    pub fn register(
        &mut self,
        instance_id: ProcessInstanceId,
        node_instance_id: u64,
        node_id: String,
        constraint: Box<dyn CompiledConstraint>,
    ) -> RegistrationId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.push(ConstraintRegistration {
            seq,
            instance_id,
            node_instance_id,
            node_id,
            constraint,
        });
        seq
    }

    /// Remove one registration; returns it when it was still live.
    pub fn deregister(&mut self, seq: RegistrationId) -> Option<ConstraintRegistration> {
        let pos = self.live.iter().position(|r| r.seq == seq)?;
        Some(self.live.remove(pos))
    }

    /// Remove every registration owned by an instance; returns how many
    /// were removed.
    pub fn deregister_instance(&mut self, instance_id: ProcessInstanceId) -> usize {
        let before = self.live.len();
        self.live.retain(|r| r.instance_id != instance_id);
        before - self.live.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintRegistration> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
