use authority_types::{AgentId, FrameworkId, OfferId};

use crate::offer::Offer;
use crate::task_status::{MasterInfo, TaskStatus};

/// Every inbound callback the broker SDK can deliver. The runtime's
/// broker-adapter thread translates these into
/// `authority_runtime::event::InputEvent`s for the pipeline; this crate
/// only defines the shape of what the broker hands us.
#[derive(Debug, Clone, PartialEq)]
pub enum BrokerEvent {
    Registered {
        framework_id: FrameworkId,
        master_info: MasterInfo,
    },
    Reregistered {
        master_info: MasterInfo,
    },
    Disconnected,
    Error {
        message: String,
    },
    ResourceOffers {
        offers: Vec<Offer>,
    },
    StatusUpdate {
        status: TaskStatus,
    },
    /// Logged only; the authority has no framework-message semantics of
    /// its own.
    FrameworkMessage {
        executor_id: String,
        agent_id: AgentId,
        data: Vec<u8>,
    },
    /// The only non-`statusUpdate` callback that mutates state: pending
    /// reservations against `offer_id` must be released.
    OfferRescinded {
        offer_id: OfferId,
    },
    SlaveLost {
        agent_id: AgentId,
    },
    ExecutorLost {
        executor_id: String,
        agent_id: AgentId,
    },
}
