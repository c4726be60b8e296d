use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Incarnation, InstanceId, OfferId};

/// A resource-broker offer: a bundle of resources on one agent, valid
/// until rescinded or its implicit broker-side timeout elapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub agent_id: AgentId,
    pub cpus: f64,
    pub mem_mb: f64,
    pub disk_mb: f64,
    /// Agent attributes available for constraint matching, e.g.
    /// `[("region", "us-east-1")]`.
    pub attributes: Vec<(String, String)>,
}

/// One launch operation bundled into an `acceptOffers` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptOperation {
    pub instance_id: InstanceId,
    pub incarnation: Incarnation,
}

/// Broker-side filter applied after a decline or accept, controlling how
/// soon the agent's resources are re-offered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub refuse_seconds: f64,
}

impl Filters {
    pub fn refuse_for(refuse_seconds: f64) -> Self {
        Self { refuse_seconds }
    }

    /// No delay: re-offer this agent's resources immediately, used after
    /// a successful accept so its remaining capacity comes back around.
    pub fn immediate() -> Self {
        Self { refuse_seconds: 0.0 }
    }
}
