//! Unit and property tests for the kernel reduction rules.

use proptest::prelude::*;
use test_case::test_case;

use authority_types::{
    AgentId, Condition, FrameworkId, Goal, Incarnation, InstanceId, OfferId, RejectionKind,
    RunSpecPath, RunSpecRef, RunSpecVersion, Timestamp,
};

use crate::command::Command;
use crate::domain::{Constraint, ConstraintOperator, ResourceRequirements, RunSpec};
use crate::kernel::{apply_command, apply_framework_event, apply_status_update, FrameworkEvent, StatusUpdate};
use crate::state::State;

fn run_spec_ref(path: &str, version: &str) -> RunSpecRef {
    RunSpecRef::new(RunSpecPath::new(path).unwrap(), RunSpecVersion::new(version))
}

fn run_spec(path: &str, version: &str) -> RunSpec {
    RunSpec {
        run_spec_ref: run_spec_ref(path, version),
        resources: ResourceRequirements {
            cpus: 1.0,
            mem_mb: 128.0,
            disk_mb: 256.0,
        },
        command: "true".to_string(),
        constraints: Vec::new(),
        desired_instances: 1,
    }
}

fn put(spec: RunSpec) -> Command {
    Command::PutRunSpec(spec)
}

// ----------------------------------------------------------------------
// PutRunSpec / DeleteRunSpec
// ----------------------------------------------------------------------

#[test]
fn put_run_spec_is_accepted_and_idempotent() {
    let spec = run_spec("/svc", "v1");
    let outcome = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO).unwrap();
    assert!(outcome.state.run_spec_exists(&spec.run_spec_ref));
    assert!(outcome.effects.is_empty());

    // Re-putting the same ref is still accepted (create-or-replace).
    let outcome2 = apply_command(outcome.state, put(spec.clone()), Timestamp::ZERO).unwrap();
    assert_eq!(outcome2.state.run_specs().count(), 1);
}

#[test]
fn delete_unknown_run_spec_is_rejected() {
    let err = apply_command(
        State::new(),
        Command::DeleteRunSpec(run_spec_ref("/svc", "v1")),
        Timestamp::ZERO,
    )
    .unwrap_err();
    assert_eq!(err.kind, RejectionKind::NoRunSpec);
}

#[test]
fn delete_run_spec_with_instances_is_rejected() {
    let spec = run_spec("/svc", "v1");
    let state = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO)
        .unwrap()
        .state;
    let id = InstanceId::random();
    let state = apply_command(
        state,
        Command::AddInstance {
            id,
            run_spec_ref: spec.run_spec_ref.clone(),
            goal: Goal::Running,
        },
        Timestamp::ZERO,
    )
    .unwrap()
    .state;

    let err = apply_command(state, Command::DeleteRunSpec(spec.run_spec_ref), Timestamp::ZERO).unwrap_err();
    assert_eq!(err.kind, RejectionKind::RunSpecInUse);
}

#[test]
fn delete_run_spec_succeeds_once_unreferenced() {
    let spec = run_spec("/svc", "v1");
    let state = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO)
        .unwrap()
        .state;
    let outcome = apply_command(state, Command::DeleteRunSpec(spec.run_spec_ref.clone()), Timestamp::ZERO).unwrap();
    assert!(!outcome.state.run_spec_exists(&spec.run_spec_ref));
}

// ----------------------------------------------------------------------
// AddInstance
// ----------------------------------------------------------------------

#[test]
fn add_instance_rejects_missing_run_spec() {
    let err = apply_command(
        State::new(),
        Command::AddInstance {
            id: InstanceId::random(),
            run_spec_ref: run_spec_ref("/svc", "v1"),
            goal: Goal::Running,
        },
        Timestamp::ZERO,
    )
    .unwrap_err();
    assert_eq!(err.kind, RejectionKind::NoRunSpec);
}

#[test]
fn add_instance_assigns_incarnation_one_and_scheduled() {
    let spec = run_spec("/svc", "v1");
    let state = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO)
        .unwrap()
        .state;
    let id = InstanceId::random();
    let outcome = apply_command(
        state,
        Command::AddInstance {
            id,
            run_spec_ref: spec.run_spec_ref,
            goal: Goal::Running,
        },
        Timestamp::from_millis(42),
    )
    .unwrap();

    let instance = outcome.state.get_instance(&id).unwrap();
    assert_eq!(instance.incarnation, Incarnation::FIRST);
    assert_eq!(instance.condition, Condition::Scheduled);
    assert_eq!(instance.created_at, Timestamp::from_millis(42));
}

#[test]
fn add_instance_rejects_duplicate_id() {
    let spec = run_spec("/svc", "v1");
    let state = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO)
        .unwrap()
        .state;
    let id = InstanceId::random();
    let state = apply_command(
        state,
        Command::AddInstance {
            id,
            run_spec_ref: spec.run_spec_ref.clone(),
            goal: Goal::Running,
        },
        Timestamp::ZERO,
    )
    .unwrap()
    .state;

    let err = apply_command(
        state,
        Command::AddInstance {
            id,
            run_spec_ref: spec.run_spec_ref,
            goal: Goal::Running,
        },
        Timestamp::ZERO,
    )
    .unwrap_err();
    assert_eq!(err.kind, RejectionKind::DuplicateInstance);
}

// ----------------------------------------------------------------------
// UpdateInstanceGoal
// ----------------------------------------------------------------------

fn state_with_running_instance() -> (State, InstanceId) {
    let spec = run_spec("/svc", "v1");
    let state = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO)
        .unwrap()
        .state;
    let id = InstanceId::random();
    let state = apply_command(
        state,
        Command::AddInstance {
            id,
            run_spec_ref: spec.run_spec_ref,
            goal: Goal::Running,
        },
        Timestamp::ZERO,
    )
    .unwrap()
    .state;
    (state, id)
}

#[test]
fn update_goal_rejects_unknown_instance() {
    let err = apply_command(
        State::new(),
        Command::UpdateInstanceGoal {
            id: InstanceId::random(),
            goal: Goal::Stopped,
        },
        Timestamp::ZERO,
    )
    .unwrap_err();
    assert_eq!(err.kind, RejectionKind::NoSuchInstance);
}

#[test]
fn update_goal_rejects_upgrade() {
    let (state, id) = state_with_running_instance();
    let state = apply_command(state, Command::UpdateInstanceGoal { id, goal: Goal::Stopped }, Timestamp::ZERO)
        .unwrap()
        .state;

    let err = apply_command(state, Command::UpdateInstanceGoal { id, goal: Goal::Running }, Timestamp::ZERO)
        .unwrap_err();
    assert_eq!(err.kind, RejectionKind::InvalidGoalTransition);
}

#[test]
fn downgrading_goal_of_non_terminal_instance_emits_kill_task() {
    let (state, id) = state_with_running_instance();
    let outcome = apply_command(state, Command::UpdateInstanceGoal { id, goal: Goal::Stopped }, Timestamp::ZERO).unwrap();

    assert_eq!(outcome.state.get_instance(&id).unwrap().goal, Goal::Stopped);
    assert!(outcome
        .effects
        .iter()
        .any(|e| matches!(e, crate::effects::Effect::KillTask { instance_id, .. } if *instance_id == id)));
}

#[test]
fn downgrading_goal_of_terminal_instance_emits_no_kill_task() {
    let (state, id) = state_with_running_instance();
    let (state, _, _) = apply_status_update(
        state,
        StatusUpdate {
            instance_id: id,
            condition: Condition::Gone,
            agent_id: None,
            timestamp: Timestamp::from_millis(1),
        },
    );

    let outcome = apply_command(state, Command::UpdateInstanceGoal { id, goal: Goal::Stopped }, Timestamp::ZERO).unwrap();
    assert!(outcome.effects.is_empty());
}

// ----------------------------------------------------------------------
// ForgetInstance
// ----------------------------------------------------------------------

#[test]
fn forget_instance_rejects_non_terminal() {
    let (state, id) = state_with_running_instance();
    let err = apply_command(state, Command::ForgetInstance(id), Timestamp::ZERO).unwrap_err();
    assert_eq!(err.kind, RejectionKind::InstanceNotTerminal);
}

#[test]
fn forget_instance_succeeds_once_terminal() {
    let (state, id) = state_with_running_instance();
    let (state, _, _) = apply_status_update(
        state,
        StatusUpdate {
            instance_id: id,
            condition: Condition::Finished,
            agent_id: None,
            timestamp: Timestamp::from_millis(1),
        },
    );
    let outcome = apply_command(state, Command::ForgetInstance(id), Timestamp::ZERO).unwrap();
    assert!(!outcome.state.instance_exists(&id));
}

// ----------------------------------------------------------------------
// ReservePlacements / ReleasePlacement
// ----------------------------------------------------------------------

#[test]
fn reserve_placements_moves_candidates_to_provisioned_and_launches() {
    let (state, id) = state_with_running_instance();
    let offer_id = OfferId::new("offer-1");
    let agent_id = AgentId::new("agent-1");
    let outcome = apply_command(
        state,
        Command::ReservePlacements {
            offer_id: offer_id.clone(),
            agent_id: agent_id.clone(),
            instance_ids: vec![id],
        },
        Timestamp::ZERO,
    )
    .unwrap();

    let instance = outcome.state.get_instance(&id).unwrap();
    assert_eq!(instance.condition, Condition::Provisioned);
    assert_eq!(instance.agent_id, Some(agent_id.clone()));
    assert!(outcome
        .effects
        .iter()
        .any(|e| matches!(e, crate::effects::Effect::LaunchTask { instance_id, .. } if *instance_id == id)));
    assert_eq!(
        outcome.state.pending_reservation(&offer_id).unwrap().1,
        vec![id]
    );
}

#[test]
fn reserve_placements_skips_non_candidates() {
    let (state, id) = state_with_running_instance();
    // Not a candidate: goal is Stopped.
    let state = apply_command(state, Command::UpdateInstanceGoal { id, goal: Goal::Stopped }, Timestamp::ZERO)
        .unwrap()
        .state;

    let outcome = apply_command(
        state,
        Command::ReservePlacements {
            offer_id: OfferId::new("offer-1"),
            agent_id: AgentId::new("agent-1"),
            instance_ids: vec![id],
        },
        Timestamp::ZERO,
    )
    .unwrap();

    assert_eq!(outcome.state.get_instance(&id).unwrap().condition, Condition::Scheduled);
    assert!(outcome.effects.is_empty());
}

#[test]
fn release_placement_reverts_reserved_instances_to_scheduled() {
    let (state, id) = state_with_running_instance();
    let offer_id = OfferId::new("offer-1");
    let state = apply_command(
        state,
        Command::ReservePlacements {
            offer_id: offer_id.clone(),
            agent_id: AgentId::new("agent-1"),
            instance_ids: vec![id],
        },
        Timestamp::ZERO,
    )
    .unwrap()
    .state;

    let outcome = apply_command(state, Command::ReleasePlacement { offer_id: offer_id.clone() }, Timestamp::ZERO).unwrap();

    let instance = outcome.state.get_instance(&id).unwrap();
    assert_eq!(instance.condition, Condition::Scheduled);
    assert!(instance.agent_id.is_none());
    assert!(outcome.state.pending_reservation(&offer_id).is_none());
}

#[test]
fn release_placement_on_unknown_offer_is_a_no_op() {
    let (state, id) = state_with_running_instance();
    let outcome = apply_command(
        state,
        Command::ReleasePlacement {
            offer_id: OfferId::new("never-reserved"),
        },
        Timestamp::ZERO,
    )
    .unwrap();
    assert_eq!(outcome.state.get_instance(&id).unwrap().condition, Condition::Scheduled);
}

// ----------------------------------------------------------------------
// Status updates
// ----------------------------------------------------------------------

#[test]
fn status_update_for_unknown_instance_emits_unknown_instance_effect() {
    let id = InstanceId::random();
    let (state, delta, effects) = apply_status_update(
        State::new(),
        StatusUpdate {
            instance_id: id,
            condition: Condition::Running,
            agent_id: None,
            timestamp: Timestamp::ZERO,
        },
    );
    assert!(delta.is_none());
    assert_eq!(state.instance_count(), 0);
    assert!(matches!(
        effects.as_slice(),
        [crate::effects::Effect::UnknownInstance { instance_id }] if *instance_id == id
    ));
}

#[test]
fn illegal_status_transition_is_silently_ignored() {
    let (state, id) = state_with_running_instance();
    let (state, _, _) = apply_status_update(
        state,
        StatusUpdate {
            instance_id: id,
            condition: Condition::Running,
            agent_id: Some(AgentId::new("agent-1")),
            timestamp: Timestamp::from_millis(1),
        },
    );

    // Running -> Scheduled moves backward on the rank lattice: illegal.
    let (state, delta, effects) = apply_status_update(
        state,
        StatusUpdate {
            instance_id: id,
            condition: Condition::Scheduled,
            agent_id: None,
            timestamp: Timestamp::from_millis(2),
        },
    );
    assert!(delta.is_none());
    assert!(effects.is_empty());
    assert_eq!(state.get_instance(&id).unwrap().condition, Condition::Running);
}

#[test]
fn legal_status_transition_notifies_and_updates_condition() {
    let (state, id) = state_with_running_instance();
    let (state, delta, effects) = apply_status_update(
        state,
        StatusUpdate {
            instance_id: id,
            condition: Condition::Provisioned,
            agent_id: Some(AgentId::new("agent-1")),
            timestamp: Timestamp::from_millis(5),
        },
    );
    assert!(delta.is_some());
    assert_eq!(state.get_instance(&id).unwrap().condition, Condition::Provisioned);
    assert!(matches!(
        effects.as_slice(),
        [crate::effects::Effect::Notify { event: crate::effects::NotifyEvent::InstanceChanged { instance_id } }]
            if *instance_id == id
    ));
}

// ----------------------------------------------------------------------
// Framework events
// ----------------------------------------------------------------------

#[test]
fn framework_registration_then_reregistration_updates_master_id() {
    let (state, delta) = apply_framework_event(
        State::new(),
        FrameworkEvent::Registered {
            framework_id: FrameworkId::new("fw-1"),
            master_id: "master-a".to_string(),
            broker_version: "1.2.0".to_string(),
        },
    );
    assert!(matches!(delta, crate::delta::JournalDelta::FrameworkRegistered { .. }));
    assert_eq!(
        state.framework_registration().unwrap().last_known_master_id,
        "master-a"
    );
    assert_eq!(
        state.framework_registration().unwrap().last_known_broker_version,
        "1.2.0"
    );

    let (state, delta) = apply_framework_event(
        state,
        FrameworkEvent::Reregistered {
            master_id: "master-b".to_string(),
            broker_version: "1.3.0".to_string(),
        },
    );
    assert!(matches!(delta, crate::delta::JournalDelta::FrameworkReregistered { .. }));
    assert_eq!(
        state.framework_registration().unwrap().last_known_master_id,
        "master-b"
    );
    assert_eq!(
        state.framework_registration().unwrap().last_known_broker_version,
        "1.3.0"
    );
}

// ----------------------------------------------------------------------
// Constraint matching (domain helper, exercised here since no dedicated
// reconciler crate touches it yet)
// ----------------------------------------------------------------------

#[test_case(ConstraintOperator::Equals, "us-east-1", &[("region", "us-east-1")] => true; "equals matches")]
#[test_case(ConstraintOperator::Equals, "us-east-1", &[("region", "us-west-2")] => false; "equals mismatches")]
#[test_case(ConstraintOperator::Equals, "us-east-1", &[] => false; "equals missing attribute")]
#[test_case(ConstraintOperator::NotEquals, "us-east-1", &[("region", "us-west-2")] => true; "not-equals satisfied")]
#[test_case(ConstraintOperator::NotEquals, "us-east-1", &[] => true; "not-equals missing attribute")]
fn constraint_matching(operator: ConstraintOperator, value: &str, attrs: &[(&str, &str)]) -> bool {
    let constraint = Constraint {
        attribute: "region".to_string(),
        operator,
        value: value.to_string(),
    };
    let attrs: Vec<(String, String)> = attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    constraint.is_satisfied_by(&attrs)
}

// ----------------------------------------------------------------------
// Property tests (state invariants)
// ----------------------------------------------------------------------

proptest! {
    /// Referential integrity holds after any sequence of accepted
    /// AddInstance commands against a known RunSpec.
    #[test]
    fn referential_integrity_holds_after_add_instance_sequence(n in 0u8..10) {
        let spec = run_spec("/svc", "v1");
        let mut state = apply_command(State::new(), put(spec.clone()), Timestamp::ZERO).unwrap().state;
        for _ in 0..n {
            state = apply_command(
                state,
                Command::AddInstance {
                    id: InstanceId::random(),
                    run_spec_ref: spec.run_spec_ref.clone(),
                    goal: Goal::Running,
                },
                Timestamp::ZERO,
            )
            .unwrap()
            .state;
        }
        prop_assert!(state.check_referential_integrity());
        prop_assert_eq!(state.instance_count() as u8, n);
    }

    /// Journal replay (`fold_all`) of the deltas produced along a
    /// command sequence reconstructs the same state reached by applying
    /// those commands directly.
    #[test]
    fn journal_replay_matches_direct_application(n in 0u8..8) {
        let spec = run_spec("/svc", "v1");
        let mut state = State::new();
        let mut deltas = Vec::new();

        let outcome = apply_command(state, put(spec.clone()), Timestamp::ZERO).unwrap();
        state = outcome.state;
        deltas.push(outcome.delta);

        for _ in 0..n {
            let outcome = apply_command(
                state,
                Command::AddInstance {
                    id: InstanceId::random(),
                    run_spec_ref: spec.run_spec_ref.clone(),
                    goal: Goal::Running,
                },
                Timestamp::ZERO,
            )
            .unwrap();
            state = outcome.state;
            deltas.push(outcome.delta);
        }

        let replayed = crate::delta::fold_all(deltas);
        prop_assert_eq!(replayed, state);
    }
}
