//! RunSpec, Instance, and FrameworkRegistration value types.

use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Condition, FrameworkId, Goal, Incarnation, InstanceId, RunSpecRef, Timestamp};

/// Resource requirements a RunSpec asks of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub cpus: f64,
    pub mem_mb: f64,
    pub disk_mb: f64,
}

impl ResourceRequirements {
    pub fn fits_within(&self, available: &ResourceRequirements) -> bool {
        self.cpus <= available.cpus && self.mem_mb <= available.mem_mb && self.disk_mb <= available.disk_mb
    }
}

/// A single placement constraint, e.g. `region == us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub attribute: String,
    pub operator: ConstraintOperator,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintOperator {
    Equals,
    NotEquals,
}

impl Constraint {
    /// Whether an offer's attribute map satisfies this constraint.
    /// A missing attribute satisfies `NotEquals` but never `Equals`.
    pub fn is_satisfied_by(&self, attributes: &[(String, String)]) -> bool {
        let found = attributes.iter().find(|(k, _)| *k == self.attribute);
        match (self.operator, found) {
            (ConstraintOperator::Equals, Some((_, v))) => v == &self.value,
            (ConstraintOperator::Equals, None) => false,
            (ConstraintOperator::NotEquals, Some((_, v))) => v != &self.value,
            (ConstraintOperator::NotEquals, None) => true,
        }
    }
}

/// A declarative run-specification for a long-running service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub run_spec_ref: RunSpecRef,
    pub resources: ResourceRequirements,
    pub command: String,
    pub constraints: Vec<Constraint>,
    pub desired_instances: u32,
}

/// A single task instance backing a RunSpec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub run_spec_ref: RunSpecRef,
    pub incarnation: Incarnation,
    pub goal: Goal,
    pub condition: Condition,
    pub agent_id: Option<AgentId>,
    pub last_status_update: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Instance {
    /// Returns true when this instance is eligible to be matched against
    /// a resource offer: `condition = Scheduled` and `goal = Running`.
    pub fn is_offer_candidate(&self) -> bool {
        self.condition == Condition::Scheduled && self.goal == Goal::Running
    }
}

/// Singleton record of this framework's registration with the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkRegistration {
    pub framework_id: FrameworkId,
    pub last_known_master_id: String,
    pub last_known_broker_version: String,
}
