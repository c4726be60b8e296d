//! The kernel — pure functional core of the state authority.
//!
//! `apply_command` reduces a committed command into new state plus the
//! durable delta and broker-facing effects it implies. It is completely
//! pure: no I/O, no clocks beyond the caller-supplied `now`, no
//! randomness. This makes it deterministic and easy to test.
//!
//! `CommandAccepted` / `CommandFailure` / `Persist` are *not* emitted
//! here — those are runtime-level effects added by `authority-runtime`
//! once the returned delta has been durably journaled. This
//! function's `Ok` effects are exactly the broker-facing and
//! notification effects a successful command implies.

use authority_types::{Condition, Rejection, RejectionKind, Timestamp};

use crate::command::Command;
use crate::delta::JournalDelta;
use crate::effects::{Effect, NotifyEvent};
use crate::state::State;

/// The outcome of successfully reducing a command: the new state, the
/// durable delta describing the transition, and any broker/notification
/// effects implied by it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub state: State,
    pub delta: JournalDelta,
    pub effects: Vec<Effect>,
}

/// Reduces a command against `state`. On success, state has *not* been
/// mutated in place — the caller receives the new state in
/// `CommandOutcome::state` and must not consider the command durable
/// until its delta has been journaled.
pub fn apply_command(state: State, command: Command, now: Timestamp) -> Result<CommandOutcome, Rejection> {
    match command {
        Command::PutRunSpec(run_spec) => {
            let delta = JournalDelta::RunSpecPut(run_spec.clone());
            let new_state = state.with_run_spec(run_spec);
            debug_assert!(new_state.run_specs().count() >= 1);
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects: Vec::new(),
            })
        }

        Command::DeleteRunSpec(run_spec_ref) => {
            if !state.run_spec_exists(&run_spec_ref) {
                return Err(Rejection::new(
                    RejectionKind::NoRunSpec,
                    format!("No runSpec {run_spec_ref}"),
                ));
            }
            if state.has_instances_referencing(&run_spec_ref) {
                return Err(Rejection::new(
                    RejectionKind::RunSpecInUse,
                    format!("runSpec {run_spec_ref} still has instances"),
                ));
            }
            let delta = JournalDelta::RunSpecDeleted(run_spec_ref.clone());
            let new_state = state.without_run_spec(&run_spec_ref);
            debug_assert!(!new_state.run_spec_exists(&run_spec_ref));
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects: Vec::new(),
            })
        }

        Command::AddInstance {
            id,
            run_spec_ref,
            goal,
        } => {
            if !state.run_spec_exists(&run_spec_ref) {
                return Err(Rejection::new(
                    RejectionKind::NoRunSpec,
                    format!("No runSpec {run_spec_ref}"),
                ));
            }
            if state.instance_exists(&id) {
                return Err(Rejection::new(
                    RejectionKind::DuplicateInstance,
                    format!("instance {id} already exists"),
                ));
            }
            let delta = JournalDelta::InstanceAdded {
                id,
                run_spec_ref: run_spec_ref.clone(),
                goal,
            };
            let new_state = state.with_new_instance_at(id, run_spec_ref, goal, now);
            debug_assert!(new_state.instance_exists(&id));
            debug_assert_eq!(
                new_state.get_instance(&id).unwrap().condition,
                Condition::Scheduled
            );
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects: Vec::new(),
            })
        }

        Command::UpdateInstanceGoal { id, goal } => {
            let instance = state
                .get_instance(&id)
                .ok_or_else(|| Rejection::new(RejectionKind::NoSuchInstance, format!("no such instance {id}")))?;
            if !instance.goal.can_transition_to(goal) {
                return Err(Rejection::new(
                    RejectionKind::InvalidGoalTransition,
                    format!("cannot move instance {id} from {:?} to {:?}", instance.goal, goal),
                ));
            }

            let mut effects = Vec::new();
            if goal != authority_types::Goal::Running && !instance.condition.is_terminal() {
                effects.push(Effect::KillTask {
                    instance_id: id,
                    incarnation: instance.incarnation,
                });
            }

            let delta = JournalDelta::InstanceGoalUpdated { id, goal };
            let new_state = state.with_instance_goal(id, goal);
            debug_assert_eq!(new_state.get_instance(&id).unwrap().goal, goal);
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects,
            })
        }

        Command::ForgetInstance(id) => {
            let instance = state
                .get_instance(&id)
                .ok_or_else(|| Rejection::new(RejectionKind::NoSuchInstance, format!("no such instance {id}")))?;
            if !instance.condition.is_terminal() {
                return Err(Rejection::new(
                    RejectionKind::InstanceNotTerminal,
                    format!("instance {id} is not terminal"),
                ));
            }
            let delta = JournalDelta::InstanceForgotten(id);
            let new_state = state.without_instance(&id);
            debug_assert!(!new_state.instance_exists(&id));
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects: Vec::new(),
            })
        }

        Command::ReservePlacements {
            offer_id,
            agent_id,
            instance_ids,
        } => {
            let reserved: Vec<_> = instance_ids
                .into_iter()
                .filter(|id| state.get_instance(id).is_some_and(|i| i.is_offer_candidate()))
                .collect();

            let mut effects = Vec::with_capacity(reserved.len() * 2);
            for id in &reserved {
                let incarnation = state.get_instance(id).unwrap().incarnation;
                effects.push(Effect::LaunchTask {
                    agent_id: agent_id.clone(),
                    instance_id: *id,
                    incarnation,
                });
                effects.push(Effect::Notify {
                    event: NotifyEvent::InstanceChanged { instance_id: *id },
                });
            }

            let delta = JournalDelta::InstancesReserved {
                offer_id: offer_id.clone(),
                agent_id: agent_id.clone(),
                instance_ids: reserved.clone(),
            };
            let new_state = state.with_instances_provisioned(offer_id, &reserved, agent_id);
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects,
            })
        }

        Command::ReleasePlacement { offer_id } => {
            let delta = JournalDelta::PlacementReleased {
                offer_id: offer_id.clone(),
            };
            let new_state = state.with_reservation_released(&offer_id);
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects: Vec::new(),
            })
        }

        Command::ReplaceTerminatedInstance { id } => {
            let instance = state
                .get_instance(&id)
                .ok_or_else(|| Rejection::new(RejectionKind::NoSuchInstance, format!("no such instance {id}")))?;
            if instance.goal != authority_types::Goal::Running || !instance.condition.is_terminal() {
                return Err(Rejection::new(
                    RejectionKind::InstanceNotTerminal,
                    format!("instance {id} is not a terminated goal=Running instance"),
                ));
            }
            let incarnation = state.next_incarnation(&id).expect("checked present above");
            let delta = JournalDelta::InstanceReplaced {
                id,
                incarnation,
                timestamp: now,
            };
            let new_state = state.with_instance_replaced(id, incarnation, now);
            debug_assert_eq!(
                new_state.get_instance(&id).unwrap().condition,
                Condition::Scheduled
            );
            Ok(CommandOutcome {
                state: new_state,
                delta,
                effects: vec![Effect::Notify {
                    event: NotifyEvent::InstanceChanged { instance_id: id },
                }],
            })
        }
    }
}

/// A broker-observed task condition change, translated from the Instance
/// Tracker into the authority's input stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub instance_id: authority_types::InstanceId,
    pub condition: Condition,
    pub agent_id: Option<authority_types::AgentId>,
    pub timestamp: Timestamp,
}

/// Applies a status update. Infallible: an unknown instance id emits
/// `UnknownInstance` without mutating state; an illegal transition is
/// silently ignored (the update is treated as stale).
pub fn apply_status_update(state: State, update: StatusUpdate) -> (State, Option<JournalDelta>, Vec<Effect>) {
    let Some(instance) = state.get_instance(&update.instance_id) else {
        return (
            state,
            None,
            vec![Effect::UnknownInstance {
                instance_id: update.instance_id,
            }],
        );
    };

    if !instance.condition.can_transition_to(update.condition) {
        return (state, None, Vec::new());
    }

    let delta = JournalDelta::InstanceConditionUpdated {
        id: update.instance_id,
        condition: update.condition,
        agent_id: update.agent_id.clone(),
        timestamp: update.timestamp,
    };
    let new_state = state.with_instance_condition(
        update.instance_id,
        update.condition,
        update.agent_id,
        update.timestamp,
    );
    debug_assert_eq!(
        new_state.get_instance(&update.instance_id).unwrap().condition,
        update.condition
    );

    let effects = vec![Effect::Notify {
        event: NotifyEvent::InstanceChanged {
            instance_id: update.instance_id,
        },
    }];
    (new_state, Some(delta), effects)
}

/// A broker framework registration handshake (`FrameworkRegistered` /
/// `FrameworkReregistered`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkEvent {
    Registered {
        framework_id: authority_types::FrameworkId,
        master_id: String,
        broker_version: String,
    },
    Reregistered {
        master_id: String,
        broker_version: String,
    },
}

/// Applies a framework registration handshake. Always accepted: the
/// first registration creates the singleton record, reregistration only
/// updates the last-known master id and broker version. Minimum-version
/// enforcement happens upstream of this function, before the event ever
/// reaches the kernel, so that a rejected registration leaves no trace
/// here.
pub fn apply_framework_event(state: State, event: FrameworkEvent) -> (State, JournalDelta) {
    match event {
        FrameworkEvent::Registered {
            framework_id,
            master_id,
            broker_version,
        } => {
            let delta = JournalDelta::FrameworkRegistered {
                framework_id: framework_id.clone(),
                master_id: master_id.clone(),
                broker_version: broker_version.clone(),
            };
            (
                state.with_framework_registration(framework_id, master_id, broker_version),
                delta,
            )
        }
        FrameworkEvent::Reregistered { master_id, broker_version } => {
            let delta = JournalDelta::FrameworkReregistered {
                master_id: master_id.clone(),
                broker_version: broker_version.clone(),
            };
            (state.with_last_known_master_id(master_id, broker_version), delta)
        }
    }
}
