//! Commands submitted to the authority as the payload of a `CommandRequest`.

use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Goal, InstanceId, OfferId, RunSpecRef};

use crate::domain::RunSpec;

/// A mutation request. Every `Command` is reduced by
/// [`crate::kernel::apply_command`] into exactly one accept-or-reject
/// outcome; no command partially mutates state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Idempotent create-or-replace of a RunSpec.
    PutRunSpec(RunSpec),

    /// Remove a RunSpec. Rejected while any Instance still references it.
    DeleteRunSpec(RunSpecRef),

    /// Create an Instance at incarnation 1, condition `Scheduled`. The
    /// referenced RunSpec must already exist and the id must be unused.
    AddInstance {
        id: InstanceId,
        run_spec_ref: RunSpecRef,
        goal: Goal,
    },

    /// Downgrade an Instance's goal (Running -> Stopped -> Decommissioned).
    UpdateInstanceGoal { id: InstanceId, goal: Goal },

    /// Remove a terminal Instance from the snapshot.
    ForgetInstance(InstanceId),

    /// Reserve a set of Scheduled instances against an offer, moving
    /// them to `Provisioned` and assigning the offer's agent. Submitted
    /// by the Offer Reconciler; reduced deterministically like
    /// any other command.
    ReservePlacements {
        offer_id: OfferId,
        agent_id: AgentId,
        instance_ids: Vec<InstanceId>,
    },

    /// Undo a prior `ReservePlacements` for an offer the broker rejected,
    /// reverting the affected instances back to `Scheduled`.
    ReleasePlacement { offer_id: OfferId },

    /// Schedule a replacement at `incarnation + 1` for a goal=Running
    /// instance whose condition just reached a terminal state. Submitted
    /// by the Offer Reconciler at the start of every reconciliation pass,
    /// never by an external caller.
    ReplaceTerminatedInstance { id: InstanceId },
}
