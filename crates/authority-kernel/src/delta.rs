//! Durable state deltas written to the persistence journal.
//!
//! Deltas are not effects: they describe only the state transition, never
//! the external-world side effects (broker calls are reconciled
//! separately). `fold` reapplies a delta to a [`State`] exactly the
//! way [`crate::kernel`] did when it first produced it, so that
//! `replay(journal(append_all(deltas)))` equals `fold(empty, deltas)`.

use serde::{Deserialize, Serialize};

use authority_types::{AgentId, Condition, FrameworkId, Goal, Incarnation, InstanceId, OfferId, RunSpecRef, Timestamp};

use crate::domain::RunSpec;
use crate::state::State;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JournalDelta {
    RunSpecPut(RunSpec),
    RunSpecDeleted(RunSpecRef),
    InstanceAdded {
        id: InstanceId,
        run_spec_ref: RunSpecRef,
        goal: Goal,
    },
    InstanceGoalUpdated {
        id: InstanceId,
        goal: Goal,
    },
    InstanceConditionUpdated {
        id: InstanceId,
        condition: Condition,
        agent_id: Option<AgentId>,
        timestamp: Timestamp,
    },
    InstanceForgotten(InstanceId),
    InstancesReserved {
        offer_id: OfferId,
        agent_id: AgentId,
        instance_ids: Vec<InstanceId>,
    },
    PlacementReleased {
        offer_id: OfferId,
    },
    InstanceReplaced {
        id: InstanceId,
        incarnation: Incarnation,
        timestamp: Timestamp,
    },
    FrameworkRegistered {
        framework_id: FrameworkId,
        master_id: String,
        broker_version: String,
    },
    FrameworkReregistered {
        master_id: String,
        broker_version: String,
    },
}

/// Reapplies a single delta to `state`, returning the resulting state.
/// Used both by the pipeline (to derive the tentative next snapshot
/// alongside `apply_command`) and by journal replay on restart.
pub fn fold(state: State, delta: &JournalDelta) -> State {
    match delta.clone() {
        JournalDelta::RunSpecPut(run_spec) => state.with_run_spec(run_spec),
        JournalDelta::RunSpecDeleted(run_spec_ref) => state.without_run_spec(&run_spec_ref),
        JournalDelta::InstanceAdded {
            id,
            run_spec_ref,
            goal,
        } => state.with_new_instance(id, run_spec_ref, goal),
        JournalDelta::InstanceGoalUpdated { id, goal } => state.with_instance_goal(id, goal),
        JournalDelta::InstanceConditionUpdated {
            id,
            condition,
            agent_id,
            timestamp,
        } => state.with_instance_condition(id, condition, agent_id, timestamp),
        JournalDelta::InstanceForgotten(id) => state.without_instance(&id),
        JournalDelta::InstancesReserved {
            offer_id,
            agent_id,
            instance_ids,
        } => state.with_instances_provisioned(offer_id, &instance_ids, agent_id),
        JournalDelta::PlacementReleased { offer_id } => state.with_reservation_released(&offer_id),
        JournalDelta::InstanceReplaced {
            id,
            incarnation,
            timestamp,
        } => state.with_instance_replaced(id, incarnation, timestamp),
        JournalDelta::FrameworkRegistered {
            framework_id,
            master_id,
            broker_version,
        } => state.with_framework_registration(framework_id, master_id, broker_version),
        JournalDelta::FrameworkReregistered { master_id, broker_version } => {
            state.with_last_known_master_id(master_id, broker_version)
        }
    }
}

/// Folds an ordered sequence of deltas starting from `State::new()`,
/// exactly as journal replay does on restart.
pub fn fold_all(deltas: impl IntoIterator<Item = JournalDelta>) -> State {
    deltas.into_iter().fold(State::new(), |s, d| fold(s, &d))
}
