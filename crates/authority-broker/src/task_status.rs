use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Condition};

/// A broker-reported task status update, keyed by the broker's own
/// opaque task id (see [`crate::task_id`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub condition: Condition,
    pub agent_id: Option<AgentId>,
}

/// Broker master connection info, passed through `registered` /
/// `reregistered` unchanged; the authority stores `master_id` and
/// `version` from it, the latter checked against the configured minimum
/// broker version at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterInfo {
    pub master_id: String,
    pub version: String,
}
