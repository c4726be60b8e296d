//! End-to-end scenarios exercising the pipeline the way a real
//! command stream would: submit `CommandRequest`s and broker events
//! through `Pipeline::submit`, then assert on the recorded responses,
//! effects, and broker calls.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use uuid::Uuid;

use authority_broker::{Offer, RecordedCall, RecordingBrokerDriver};
use authority_journal::InMemoryJournal;
use authority_kernel::domain::{ResourceRequirements, RunSpec};
use authority_kernel::{kernel, Command};
use authority_runtime::{
    CommandResponse, CrashStrategy, FixedClock, InputEvent, Pipeline, PipelineConfig, RecordingEffectSink,
};
use authority_types::{AgentId, Condition, Goal, InstanceId, OfferId, Rejection, RejectionKind, RequestId, RunSpecPath,
    RunSpecRef, RunSpecVersion, Timestamp};

fn svc_run_spec() -> RunSpec {
    RunSpec {
        run_spec_ref: RunSpecRef::new(RunSpecPath::new("/svc").unwrap(), RunSpecVersion::new("v1")),
        resources: ResourceRequirements {
            cpus: 0.5,
            mem_mb: 256.0,
            disk_mb: 0.0,
        },
        command: "true".to_string(),
        constraints: Vec::new(),
        desired_instances: 1,
    }
}

fn start_pipeline() -> (Pipeline, Arc<RecordingEffectSink>, Arc<RecordingBrokerDriver>) {
    let journal = Arc::new(InMemoryJournal::new());
    let broker = Arc::new(RecordingBrokerDriver::new());
    let clock = Arc::new(FixedClock::new(Timestamp::ZERO));
    let sink = Arc::new(RecordingEffectSink::new());
    let crash = Arc::new(CrashStrategy::with_exit(Arc::new(|code| {
        panic!("crash strategy should not fire in this test (exit code {code})")
    })));

    let pipeline = Pipeline::start(PipelineConfig::default(), journal, broker.clone(), clock, sink.clone(), crash)
        .unwrap();
    pipeline.submit(InputEvent::LeadershipAcquired).unwrap();
    wait_until(|| pipeline.is_leader());
    (pipeline, sink, broker)
}

fn wait_until(mut predicate: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if predicate() {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("condition never became true");
}

fn submit_command(pipeline: &Pipeline, request_id: &str, command: Command) {
    pipeline
        .submit(InputEvent::CommandRequest {
            request_id: RequestId::new(request_id),
            command,
        })
        .unwrap();
}

/// Scenario 1: submitting `AddInstance` against an unknown RunSpec is
/// rejected, and nothing else is ever emitted.
#[test]
fn reject_unknown_run_spec() {
    let (pipeline, sink, _broker) = start_pipeline();

    let instance_id = InstanceId::from(Uuid::parse_str("deadbeef-dead-beef-dead-beefdeadffff").unwrap());
    submit_command(
        &pipeline,
        "1011",
        Command::AddInstance {
            id: instance_id,
            run_spec_ref: RunSpecRef::new(RunSpecPath::new("/lol").unwrap(), RunSpecVersion::new("blue")),
            goal: Goal::Running,
        },
    );

    wait_until(|| !sink.responses().is_empty());
    assert_eq!(sink.responses().len(), 1);
    assert_eq!(
        sink.responses()[0],
        CommandResponse::Failed {
            request_id: RequestId::new("1011"),
            rejection: Rejection::new(RejectionKind::NoRunSpec, "No runSpec /lol#blue"),
        }
    );
    assert!(sink.effects().is_empty());

    pipeline.shutdown();
}

/// Scenario 2: a RunSpec plus a Scheduled instance, matched against a
/// fitting offer, launches and accepts.
#[test]
fn accept_and_launch() {
    let (pipeline, sink, broker) = start_pipeline();
    let instance_id = InstanceId::random();

    submit_command(&pipeline, "r1", Command::PutRunSpec(svc_run_spec()));
    submit_command(
        &pipeline,
        "r2",
        Command::AddInstance {
            id: instance_id,
            run_spec_ref: svc_run_spec().run_spec_ref,
            goal: Goal::Running,
        },
    );
    wait_until(|| sink.responses().len() >= 2);
    assert!(sink.responses().iter().all(|r| matches!(r, CommandResponse::Accepted { .. })));
    assert_eq!(
        pipeline.snapshot().get_instance(&instance_id).unwrap().condition,
        Condition::Scheduled
    );

    pipeline
        .submit(InputEvent::OfferReceived(Offer {
            id: OfferId::new("O"),
            agent_id: AgentId::new("A"),
            cpus: 1.0,
            mem_mb: 1024.0,
            disk_mb: 0.0,
            attributes: Vec::new(),
        }))
        .unwrap();

    wait_until(|| !broker.calls().is_empty());
    assert_eq!(broker.calls().len(), 1);
    match &broker.calls()[0] {
        RecordedCall::AcceptOffers {
            offer_id,
            operations,
            filters,
        } => {
            assert_eq!(offer_id, &OfferId::new("O"));
            assert_eq!(operations.len(), 1);
            assert_eq!(operations[0].instance_id, instance_id);
            assert_eq!(filters.refuse_seconds, 0.0);
        }
        other => panic!("expected AcceptOffers, got {other:?}"),
    }
    assert_eq!(
        pipeline.snapshot().get_instance(&instance_id).unwrap().condition,
        Condition::Provisioned
    );

    pipeline.shutdown();
}

/// Scenario 3: a RunSpec still referenced by an instance cannot be
/// deleted.
#[test]
fn reject_delete_run_spec_with_dependents() {
    let (pipeline, sink, _broker) = start_pipeline();
    let instance_id = InstanceId::random();

    submit_command(&pipeline, "r1", Command::PutRunSpec(svc_run_spec()));
    submit_command(
        &pipeline,
        "r2",
        Command::AddInstance {
            id: instance_id,
            run_spec_ref: svc_run_spec().run_spec_ref,
            goal: Goal::Running,
        },
    );
    wait_until(|| sink.responses().len() >= 2);

    submit_command(&pipeline, "r3", Command::DeleteRunSpec(svc_run_spec().run_spec_ref));
    wait_until(|| sink.responses().len() >= 3);
    assert_eq!(
        sink.responses()[2],
        CommandResponse::Failed {
            request_id: RequestId::new("r3"),
            rejection: Rejection::new(
                RejectionKind::RunSpecInUse,
                format!("runSpec {} still has instances", svc_run_spec().run_spec_ref)
            ),
        }
    );

    pipeline.shutdown();
}

/// Scenario 4: downgrading an instance's goal while it's running kills
/// its task; once it reaches a terminal condition it can be forgotten.
#[test]
fn goal_downgrade_causes_kill_then_forget() {
    let (pipeline, sink, broker) = start_pipeline();
    let instance_id = InstanceId::random();

    submit_command(&pipeline, "r1", Command::PutRunSpec(svc_run_spec()));
    submit_command(
        &pipeline,
        "r2",
        Command::AddInstance {
            id: instance_id,
            run_spec_ref: svc_run_spec().run_spec_ref,
            goal: Goal::Running,
        },
    );
    wait_until(|| sink.responses().len() >= 2);

    pipeline
        .submit(InputEvent::StatusUpdate(kernel::StatusUpdate {
            instance_id,
            condition: Condition::Running,
            agent_id: Some(AgentId::new("A")),
            timestamp: Timestamp::from_millis(1),
        }))
        .unwrap();
    wait_until(|| pipeline.snapshot().get_instance(&instance_id).unwrap().condition == Condition::Running);

    submit_command(
        &pipeline,
        "r3",
        Command::UpdateInstanceGoal {
            id: instance_id,
            goal: Goal::Stopped,
        },
    );
    wait_until(|| sink.responses().len() >= 3);
    assert_eq!(
        sink.responses()[2],
        CommandResponse::Accepted {
            request_id: RequestId::new("r3")
        }
    );
    wait_until(|| {
        broker
            .calls()
            .iter()
            .any(|c| matches!(c, RecordedCall::KillTask { .. }))
    });

    pipeline
        .submit(InputEvent::StatusUpdate(kernel::StatusUpdate {
            instance_id,
            condition: Condition::Finished,
            agent_id: Some(AgentId::new("A")),
            timestamp: Timestamp::from_millis(2),
        }))
        .unwrap();
    wait_until(|| pipeline.snapshot().get_instance(&instance_id).unwrap().condition == Condition::Finished);

    submit_command(
        &pipeline,
        "r4",
        Command::UpdateInstanceGoal {
            id: instance_id,
            goal: Goal::Decommissioned,
        },
    );
    wait_until(|| sink.responses().len() >= 4);
    assert_eq!(
        sink.responses()[3],
        CommandResponse::Accepted {
            request_id: RequestId::new("r4")
        }
    );

    submit_command(&pipeline, "r5", Command::ForgetInstance(instance_id));
    wait_until(|| sink.responses().len() >= 5);
    assert_eq!(
        sink.responses()[4],
        CommandResponse::Accepted {
            request_id: RequestId::new("r5")
        }
    );
    assert!(!pipeline.snapshot().instance_exists(&instance_id));

    pipeline.shutdown();
}

/// Scenario 5: commands still in flight when leadership is lost are
/// rejected; nothing that already committed is undone, and nothing
/// else is silently dropped.
#[test]
fn leadership_loss_rejects_commands_in_flight() {
    let (pipeline, sink, _broker) = start_pipeline();

    submit_command(&pipeline, "r1", Command::PutRunSpec(svc_run_spec()));
    wait_until(|| !sink.responses().is_empty());
    assert_eq!(
        sink.responses()[0],
        CommandResponse::Accepted {
            request_id: RequestId::new("r1")
        }
    );

    pipeline.submit(InputEvent::LeadershipLost).unwrap();
    wait_until(|| !pipeline.is_leader());

    submit_command(&pipeline, "r2", Command::PutRunSpec(svc_run_spec()));
    submit_command(&pipeline, "r3", Command::PutRunSpec(svc_run_spec()));
    wait_until(|| sink.responses().len() >= 3);

    for (idx, request_id) in [(1, "r2"), (2, "r3")] {
        assert_eq!(
            sink.responses()[idx],
            CommandResponse::Failed {
                request_id: RequestId::new(request_id),
                rejection: Rejection::new(RejectionKind::LeadershipLost, "not the leader"),
            }
        );
    }

    pipeline.shutdown();
}

/// Scenario 6: a goal can never move back up once downgraded.
#[test]
fn invalid_goal_transition_is_rejected() {
    let (pipeline, sink, _broker) = start_pipeline();
    let instance_id = InstanceId::random();

    submit_command(&pipeline, "r1", Command::PutRunSpec(svc_run_spec()));
    submit_command(
        &pipeline,
        "r2",
        Command::AddInstance {
            id: instance_id,
            run_spec_ref: svc_run_spec().run_spec_ref,
            goal: Goal::Running,
        },
    );
    submit_command(
        &pipeline,
        "r3",
        Command::UpdateInstanceGoal {
            id: instance_id,
            goal: Goal::Stopped,
        },
    );
    submit_command(
        &pipeline,
        "r4",
        Command::UpdateInstanceGoal {
            id: instance_id,
            goal: Goal::Decommissioned,
        },
    );
    wait_until(|| sink.responses().len() >= 4);
    assert!(sink.responses()[..4]
        .iter()
        .all(|r| matches!(r, CommandResponse::Accepted { .. })));

    submit_command(
        &pipeline,
        "r5",
        Command::UpdateInstanceGoal {
            id: instance_id,
            goal: Goal::Running,
        },
    );
    wait_until(|| sink.responses().len() >= 5);
    assert_eq!(
        sink.responses()[4],
        CommandResponse::Failed {
            request_id: RequestId::new("r5"),
            rejection: Rejection::new(
                RejectionKind::InvalidGoalTransition,
                format!(
                    "cannot move instance {instance_id} from {:?} to {:?}",
                    Goal::Decommissioned,
                    Goal::Running
                )
            ),
        }
    );

    pipeline.shutdown();
}
