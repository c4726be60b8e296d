//! The state authority pipeline: single-writer worker thread wiring the
//! kernel, journal, broker driver, and offer reconciler together.
//!
//! Exactly one thread ever calls `apply_command`/`apply_status_update`/
//! `reconcile` against the authoritative snapshot ("single-writer,
//! deterministic"). Every other component — the broker adapter thread,
//! the command-ingress HTTP/gRPC handler, the Instance Tracker's
//! debounce timers — only ever pushes an [`InputEvent`] onto the bounded
//! queue and, for commands, waits on a response channel keyed by
//! `request_id`.
//!
//! Readers that only need the latest snapshot (status endpoints, the
//! Instance Tracker's reconciliation pass) read `Pipeline::snapshot()`,
//! an `Arc<ArcSwap<State>>` published only after the delta behind it is
//! durably journaled — never before.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use arc_swap::ArcSwap;
use tracing::{debug, error, info, warn};

use authority_broker::{AcceptOperation, BrokerDriver, Filters};
use authority_journal::Journal;
use authority_kernel::{kernel, Command, Effect, JournalDelta, State};
use authority_reconciler::{self, ReconcileConfig};
use authority_types::{Rejection, RejectionKind, RequestId};

use crate::bounded_queue::{BoundedQueue, PushResult};
use crate::clock::Clock;
use crate::crash::{catch_reducer_panic, CrashStrategy};
use crate::event::InputEvent;

/// A command's outcome once the pipeline has either journaled and
/// published it or rejected it. Delivered to whatever submitted the
/// `CommandRequest`, via [`ResponseSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResponse {
    Accepted { request_id: RequestId },
    Failed { request_id: RequestId, rejection: Rejection },
}

/// Where the pipeline delivers effects it doesn't consume itself:
/// `CommandAccepted`/`CommandFailure` responses and `Notify`/
/// `UnknownInstance` effects for the Instance Tracker and any pub/sub
/// observers. `LaunchTask`/`KillTask`/`AcceptOffer`/`DeclineOffer` are
/// always dispatched to the `BrokerDriver` directly and never reach this
/// sink.
pub trait EffectSink: Send + Sync {
    fn command_response(&self, response: CommandResponse);
    fn effect(&self, effect: Effect);
}

/// An `EffectSink` that records everything, for tests.
#[derive(Debug, Default)]
pub struct RecordingEffectSink {
    responses: Mutex<Vec<CommandResponse>>,
    effects: Mutex<Vec<Effect>>,
}

impl RecordingEffectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn responses(&self) -> Vec<CommandResponse> {
        self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone()
    }
}

impl EffectSink for RecordingEffectSink {
    fn command_response(&self, response: CommandResponse) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(response);
    }

    fn effect(&self, effect: Effect) {
        self.effects.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(effect);
    }
}

/// Configuration the pipeline needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    pub reconcile: ReconcileConfig,
    /// Minimum broker semantic version accepted at registration. A
    /// broker reporting anything lower triggers the crash strategy
    /// without removing the framework id, so a later, compatible broker
    /// can still rejoin under the same registration.
    pub min_broker_version: semver::Version,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            reconcile: ReconcileConfig::default(),
            min_broker_version: semver::Version::new(0, 0, 0),
        }
    }
}

/// Wires the kernel, journal, broker driver, and reconciler behind a
/// single worker thread and a bounded input queue.
pub struct Pipeline {
    queue: Arc<BoundedQueue<InputEvent>>,
    snapshot: Arc<ArcSwap<State>>,
    is_leader: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Pipeline {
    /// Replays the journal to build the initial snapshot, then spawns
    /// the worker thread. The worker starts out *not* leading; submit
    /// `InputEvent::LeadershipAcquired` once the Leadership Gate
    /// confirms this process holds the lease.
    pub fn start(
        config: PipelineConfig,
        journal: Arc<dyn Journal>,
        broker: Arc<dyn BrokerDriver>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EffectSink>,
        crash_strategy: Arc<CrashStrategy>,
    ) -> Result<Self, authority_journal::JournalError> {
        let deltas = journal.replay()?;
        let initial_state = authority_kernel::delta::fold_all(deltas);
        info!(instances = initial_state.instance_count(), "replayed journal");

        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let snapshot = Arc::new(ArcSwap::from_pointee(initial_state));
        let is_leader = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            queue: Arc::clone(&queue),
            snapshot: Arc::clone(&snapshot),
            is_leader: Arc::clone(&is_leader),
            journal,
            broker,
            clock,
            sink,
            crash_strategy,
            reconcile_config: config.reconcile,
            min_broker_version: config.min_broker_version,
        };

        let handle = thread::Builder::new()
            .name("authority-pipeline".to_string())
            .spawn(move || worker.run())
            .expect("failed to spawn pipeline worker thread");

        Ok(Self {
            queue,
            snapshot,
            is_leader,
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Attempts to enqueue an event. Returns the event back on
    /// backpressure (the caller should respond with `QueueFull`).
    pub fn submit(&self, event: InputEvent) -> Result<(), InputEvent> {
        match self.queue.try_push(event) {
            PushResult::Ok => Ok(()),
            PushResult::Backpressure(event) => Err(event),
        }
    }

    /// The most recently published, durably-journaled snapshot.
    pub fn snapshot(&self) -> Arc<State> {
        self.snapshot.load_full()
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader.load(Ordering::SeqCst)
    }

    /// Signals the worker to stop after draining the queue, and joins
    /// its thread. Safe to call more than once.
    pub fn shutdown(&self) {
        let _ = self.submit(InputEvent::Shutdown);
        if let Some(handle) = self.handle.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    queue: Arc<BoundedQueue<InputEvent>>,
    snapshot: Arc<ArcSwap<State>>,
    is_leader: Arc<AtomicBool>,
    journal: Arc<dyn Journal>,
    broker: Arc<dyn BrokerDriver>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EffectSink>,
    crash_strategy: Arc<CrashStrategy>,
    reconcile_config: ReconcileConfig,
    min_broker_version: semver::Version,
}

impl Worker {
    fn run(self) {
        loop {
            match self.queue.try_pop() {
                Some(InputEvent::Shutdown) => {
                    info!("pipeline worker shutting down");
                    break;
                }
                Some(event) => self.handle_event(event),
                None => thread::yield_now(),
            }
        }
    }

    fn handle_event(&self, event: InputEvent) {
        match event {
            InputEvent::Shutdown => unreachable!("handled in run()"),
            InputEvent::LeadershipAcquired => {
                self.is_leader.store(true, Ordering::SeqCst);
                match self.journal.replay() {
                    Ok(deltas) => {
                        let rebuilt = authority_kernel::delta::fold_all(deltas);
                        self.snapshot.store(Arc::new(rebuilt));
                        self.sink.effect(Effect::Notify {
                            event: authority_kernel::NotifyEvent::LeaderElected,
                        });
                        info!("leadership acquired, snapshot rebuilt from journal");
                    }
                    Err(err) => {
                        error!(%err, "failed to replay journal on leadership acquisition");
                        self.crash_strategy.escalate(
                            &crate::crash::FatalError::new(format!("journal replay failed: {err}")),
                            &self.is_leader,
                            self.sink.as_ref(),
                        );
                    }
                }
            }
            InputEvent::LeadershipLost => {
                self.is_leader.store(false, Ordering::SeqCst);
                warn!("leadership lost");
            }
            InputEvent::CommandRequest { request_id, command } => self.handle_command(request_id, command),
            InputEvent::StatusUpdate(update) => self.handle_status_update(update),
            InputEvent::FrameworkEvent(event) => self.handle_framework_event(event),
            InputEvent::OfferReceived(offer) => self.handle_offer(offer),
            InputEvent::OfferRescinded { offer_id } => self.handle_offer_rescinded(offer_id),
        }
    }

    fn handle_command(&self, request_id: RequestId, command: Command) {
        if !self.is_leader.load(Ordering::SeqCst) {
            self.sink.command_response(CommandResponse::Failed {
                request_id,
                rejection: Rejection::new(RejectionKind::LeadershipLost, "not the leader"),
            });
            return;
        }

        let state = self.snapshot.load_full();
        let now = self.clock.now();
        let outcome = catch_reducer_panic(|| authority_kernel::apply_command((*state).clone(), command, now));

        match outcome {
            Err(fatal) => self
                .crash_strategy
                .escalate(&fatal, &self.is_leader, self.sink.as_ref()),
            Ok(Err(rejection)) => {
                self.sink.command_response(CommandResponse::Failed { request_id, rejection });
            }
            Ok(Ok(kernel::CommandOutcome { state, delta, effects })) => {
                self.persist_and_publish(vec![delta], state, effects, Some(request_id));
            }
        }
    }

    fn handle_status_update(&self, update: kernel::StatusUpdate) {
        if !self.is_leader.load(Ordering::SeqCst) {
            return;
        }
        let state = self.snapshot.load_full();
        let (new_state, delta, effects) = authority_kernel::apply_status_update((*state).clone(), update);
        if let Some(delta) = delta {
            self.persist_and_publish(vec![delta], new_state, effects, None);
        } else {
            // Stale or unknown update: still surface its effects (e.g.
            // UnknownInstance) even though nothing was persisted.
            for effect in effects {
                self.sink.effect(effect);
            }
        }
    }

    fn handle_framework_event(&self, event: kernel::FrameworkEvent) {
        if !self.is_leader.load(Ordering::SeqCst) {
            return;
        }
        let reported_version = match &event {
            kernel::FrameworkEvent::Registered { broker_version, .. } => broker_version,
            kernel::FrameworkEvent::Reregistered { broker_version, .. } => broker_version,
        };
        match semver::Version::parse(reported_version) {
            Ok(version) if version < self.min_broker_version => {
                error!(
                    broker_version = %reported_version,
                    min_broker_version = %self.min_broker_version,
                    "broker below minimum version, refusing registration"
                );
                self.crash_strategy.escalate(
                    &crate::crash::FatalError::new(format!(
                        "broker version {reported_version} is below the minimum {}",
                        self.min_broker_version
                    )),
                    &self.is_leader,
                    self.sink.as_ref(),
                );
                return;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(broker_version = %reported_version, %err, "broker reported an unparsable version, proceeding");
            }
        }

        let state = self.snapshot.load_full();
        let (new_state, delta) = authority_kernel::apply_framework_event((*state).clone(), event);
        self.persist_and_publish(vec![delta], new_state, Vec::new(), None);
    }

    fn handle_offer(&self, offer: authority_broker::Offer) {
        if !self.is_leader.load(Ordering::SeqCst) {
            return;
        }
        let state = self.snapshot.load_full();
        let now = self.clock.now();
        let outcome = authority_reconciler::reconcile((*state).clone(), &offer, now, &self.reconcile_config);
        self.persist_and_publish(outcome.deltas, outcome.state, outcome.effects, None);
    }

    fn handle_offer_rescinded(&self, offer_id: authority_types::OfferId) {
        if !self.is_leader.load(Ordering::SeqCst) {
            return;
        }
        let state = self.snapshot.load_full();
        let now = self.clock.now();
        let outcome = authority_reconciler::release_offer((*state).clone(), offer_id, now);
        self.persist_and_publish(vec![outcome.delta], outcome.state, outcome.effects, None);
    }

    /// Journals `deltas` as a single batch, and only on success publishes
    /// `new_state` and dispatches `effects`. A journal failure surfaces as
    /// `CommandFailure{PersistenceUnavailable}` (when there's a
    /// `request_id` to answer) and leaves the snapshot untouched — none of
    /// the batch happened as far as any reader can observe.
    fn persist_and_publish(
        &self,
        deltas: Vec<JournalDelta>,
        new_state: State,
        effects: Vec<Effect>,
        request_id: Option<RequestId>,
    ) {
        match self.journal.append(&deltas) {
            Ok(ack) => {
                debug!(sequence = ack.sequence, "delta journaled");
                self.snapshot.store(Arc::new(new_state));
                self.dispatch_effects(effects);
                if let Some(request_id) = request_id {
                    self.sink.command_response(CommandResponse::Accepted { request_id });
                }
            }
            Err(err) => {
                error!(%err, "journal append failed");
                if let Some(request_id) = request_id {
                    self.sink.command_response(CommandResponse::Failed {
                        request_id,
                        rejection: Rejection::new(RejectionKind::PersistenceUnavailable, err.to_string()),
                    });
                }
            }
        }
    }

    fn dispatch_effects(&self, effects: Vec<Effect>) {
        let mut launches: Vec<(authority_types::AgentId, AcceptOperation)> = Vec::new();
        let mut offer_decision: Option<(authority_types::OfferId, bool, f64)> = None;

        for effect in effects {
            match effect {
                Effect::LaunchTask {
                    agent_id,
                    instance_id,
                    incarnation,
                } => {
                    launches.push((
                        agent_id,
                        AcceptOperation {
                            instance_id,
                            incarnation,
                        },
                    ));
                }
                Effect::KillTask { instance_id, incarnation } => {
                    let task_id = authority_broker::task_id::encode(instance_id, incarnation);
                    if let Err(err) = self.broker.kill_task(&task_id) {
                        warn!(%err, task_id, "kill_task failed");
                    }
                }
                Effect::AcceptOffer { offer_id, refuse_seconds } => {
                    offer_decision = Some((offer_id, true, refuse_seconds));
                }
                Effect::DeclineOffer { offer_id, refuse_seconds } => {
                    offer_decision = Some((offer_id, false, refuse_seconds));
                }
                Effect::Persist { .. } | Effect::CommandAccepted { .. } | Effect::CommandFailure { .. } => {
                    // Not produced by the kernel today (see effects.rs);
                    // forward defensively rather than silently drop.
                    self.sink.effect(effect);
                }
                Effect::Notify { .. } | Effect::UnknownInstance { .. } => {
                    self.sink.effect(effect);
                }
            }
        }

        if let Some((offer_id, accept, refuse_seconds)) = offer_decision {
            let filters = Filters::refuse_for(refuse_seconds);
            let result = if accept {
                let operations: Vec<AcceptOperation> = launches.into_iter().map(|(_, op)| op).collect();
                self.broker.accept_offers(&offer_id, &operations, filters)
            } else {
                self.broker.decline_offer(&offer_id, filters)
            };
            if let Err(err) = result {
                warn!(%err, %offer_id, "broker offer call failed");
            }
        }
    }
}
