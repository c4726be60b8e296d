use serde::{Deserialize, Serialize};

/// Observed lifecycle state of an Instance.
///
/// Terminal states ({Finished, Failed, Gone}) are a closed set: once
/// reached, no non-terminal transition is permitted (data model
/// invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Scheduled,
    Provisioned,
    Staging,
    Running,
    Killing,
    Finished,
    Failed,
    Gone,
}

impl Condition {
    pub fn is_terminal(self) -> bool {
        matches!(self, Condition::Finished | Condition::Failed | Condition::Gone)
    }

    /// Whether `self -> next` is a legal transition under the condition
    /// lattice: forward progress through the non-terminal chain, or a
    /// move into any terminal state, but never out of a terminal state.
    pub fn can_transition_to(self, next: Condition) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next.is_terminal() {
            return true;
        }
        self.rank() <= next.rank()
    }

    /// Ordinal position in the non-terminal chain. Terminal states have
    /// no meaningful rank relative to each other; only used to compare
    /// two non-terminal conditions.
    fn rank(self) -> u8 {
        match self {
            Condition::Scheduled => 0,
            Condition::Provisioned => 1,
            Condition::Staging => 2,
            Condition::Running => 3,
            Condition::Killing => 4,
            Condition::Finished | Condition::Failed | Condition::Gone => u8::MAX,
        }
    }
}

/// Desired end-state for an Instance, set by the operator via
/// `UpdateInstanceGoal`. Monotone: once `Decommissioned`, permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Goal {
    Running,
    Stopped,
    Decommissioned,
}

impl Goal {
    fn rank(self) -> u8 {
        match self {
            Goal::Running => 0,
            Goal::Stopped => 1,
            Goal::Decommissioned => 2,
        }
    }

    /// Goal transitions only ever downgrade: Running -> Stopped ->
    /// Decommissioned. Staying at the same goal is allowed (idempotent
    /// re-request); moving back up is rejected.
    pub fn can_transition_to(self, next: Goal) -> bool {
        next.rank() >= self.rank()
    }
}
