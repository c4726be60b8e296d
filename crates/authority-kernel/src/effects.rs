//! Effects produced by the kernel.
//!
//! Effects are externally-observable consequences of applying a command:
//! persistence writes, broker-driving calls, and acknowledgements. The
//! kernel is pure — it produces effects but never executes them; the
//! runtime (`authority-runtime`) dispatches each to the matching
//! consumer (journal, broker adapter, response channel).

use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Incarnation, InstanceId, OfferId, Rejection, RequestId};

use crate::delta::JournalDelta;

/// An effect to be executed by the runtime, in the order the reducer
/// emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// The command committed; no further effects follow for this
    /// command other than the ones already in this same batch.
    CommandAccepted { request_id: RequestId },

    /// The command was rejected before any state change.
    CommandFailure {
        request_id: RequestId,
        rejection: Rejection,
    },

    /// Drive the broker to launch a task for an Instance.
    LaunchTask {
        agent_id: AgentId,
        instance_id: InstanceId,
        incarnation: Incarnation,
    },

    /// Drive the broker to kill a task backing an Instance.
    KillTask {
        instance_id: InstanceId,
        incarnation: Incarnation,
    },

    /// Accept a resource offer with the given refuse-filter duration.
    AcceptOffer { offer_id: OfferId, refuse_seconds: f64 },

    /// Decline a resource offer with the given refuse-filter duration.
    DeclineOffer { offer_id: OfferId, refuse_seconds: f64 },

    /// Ordered, durable write to the persistence journal.
    Persist {
        transaction_id: u64,
        delta: JournalDelta,
    },

    /// Pub/sub notification to observers.
    Notify { event: NotifyEvent },

    /// A `StatusUpdate` referenced an Instance id the authority doesn't
    /// know about. Does not mutate state; the broker reconciliation path
    /// (Instance Tracker) uses this to reap the orphaned task.
    UnknownInstance { instance_id: InstanceId },
}

/// Pub/sub notification payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyEvent {
    InstanceChanged { instance_id: InstanceId },
    LeaderElected,
    SchedulerDisconnected,
}
