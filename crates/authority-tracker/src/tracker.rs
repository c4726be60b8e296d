//! Translates broker callbacks into the pipeline's input stream.
//!
//! The tracker owns no authoritative state of its own — it only reads
//! the pipeline's published snapshot to decide whether a reported task
//! id is orphaned, and to build the bulk reconciliation list on
//! leadership acquisition. Every mutation still goes through the
//! pipeline's single worker thread as a `StatusUpdate` `InputEvent`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use authority_broker::{BrokerDriver, BrokerEvent, TaskStatus};
use authority_kernel::kernel::StatusUpdate;
use authority_runtime::{InputEvent, Pipeline};
use authority_types::{InstanceId, Timestamp};

/// How long a UUID's status floods are collapsed to their last reported
/// condition before being forwarded to the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub debounce_window: Duration,
    /// How often the flush thread scans for windows that have elapsed.
    pub flush_tick: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(100),
            flush_tick: Duration::from_millis(20),
        }
    }
}

struct Pending {
    update: StatusUpdate,
    first_seen: Instant,
}

/// Consumes [`BrokerEvent`]s, debounces status floods per instance, reaps
/// orphaned tasks directly against the broker, and drives bulk
/// reconciliation when this process becomes leader.
pub struct InstanceTracker {
    pipeline: Arc<Pipeline>,
    broker: Arc<dyn BrokerDriver>,
    config: TrackerConfig,
    pending: Mutex<HashMap<InstanceId, Pending>>,
    running: Arc<AtomicBool>,
    flush_handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl InstanceTracker {
    pub fn start(pipeline: Arc<Pipeline>, broker: Arc<dyn BrokerDriver>, config: TrackerConfig) -> Arc<Self> {
        let tracker = Arc::new(Self {
            pipeline,
            broker,
            config,
            pending: Mutex::new(HashMap::new()),
            running: Arc::new(AtomicBool::new(true)),
            flush_handle: Mutex::new(None),
        });

        let worker = Arc::clone(&tracker);
        let handle = thread::Builder::new()
            .name("authority-tracker-flush".to_string())
            .spawn(move || worker.flush_loop())
            .expect("failed to spawn tracker flush thread");
        *tracker.flush_handle.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(handle);

        tracker
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self
            .flush_handle
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
        {
            let _ = handle.join();
        }
    }

    /// Handles one inbound broker callback.
    pub fn handle_broker_event(&self, event: BrokerEvent, now: Timestamp) {
        match event {
            BrokerEvent::StatusUpdate { status } => self.handle_status(status, now),
            BrokerEvent::OfferRescinded { offer_id } => {
                if self.pipeline.submit(InputEvent::OfferRescinded { offer_id }).is_err() {
                    warn!("offer-rescinded event dropped: input queue full");
                }
            }
            BrokerEvent::ResourceOffers { offers } => {
                for offer in offers {
                    if self.pipeline.submit(InputEvent::OfferReceived(offer)).is_err() {
                        warn!("resource-offer event dropped: input queue full");
                    }
                }
            }
            BrokerEvent::Registered { framework_id, master_info } => {
                if self
                    .pipeline
                    .submit(InputEvent::FrameworkEvent(
                        authority_kernel::kernel::FrameworkEvent::Registered {
                            framework_id,
                            master_id: master_info.master_id,
                            broker_version: master_info.version,
                        },
                    ))
                    .is_err()
                {
                    warn!("registered event dropped: input queue full");
                }
            }
            BrokerEvent::Reregistered { master_info } => {
                if self
                    .pipeline
                    .submit(InputEvent::FrameworkEvent(
                        authority_kernel::kernel::FrameworkEvent::Reregistered {
                            master_id: master_info.master_id,
                            broker_version: master_info.version,
                        },
                    ))
                    .is_err()
                {
                    warn!("reregistered event dropped: input queue full");
                }
            }
            BrokerEvent::SlaveLost { agent_id } => {
                debug!(%agent_id, "slave lost, awaiting individual status updates");
            }
            BrokerEvent::Disconnected | BrokerEvent::Error { .. } | BrokerEvent::FrameworkMessage { .. } => {
                // Logged only; no state mutation of our own.
            }
            BrokerEvent::ExecutorLost { executor_id, agent_id } => {
                debug!(executor_id, %agent_id, "executor lost");
            }
        }
    }

    fn handle_status(&self, status: TaskStatus, now: Timestamp) {
        let Some((instance_id, _incarnation)) = authority_broker::task_id::decode(&status.task_id) else {
            warn!(task_id = status.task_id, "orphaned task id, reaping");
            if let Err(err) = self.broker.kill_task(&status.task_id) {
                warn!(%err, task_id = status.task_id, "failed to kill orphaned task");
            }
            return;
        };

        let update = StatusUpdate {
            instance_id,
            condition: status.condition,
            agent_id: status.agent_id,
            timestamp: now,
        };

        let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        pending
            .entry(instance_id)
            .and_modify(|p| p.update = update.clone())
            .or_insert(Pending {
                update,
                first_seen: Instant::now(),
            });
    }

    fn flush_loop(&self) {
        while self.running.load(Ordering::SeqCst) {
            thread::sleep(self.config.flush_tick);
            self.flush_elapsed();
        }
        // Final flush so nothing pending is lost on shutdown.
        self.flush_elapsed();
    }

    fn flush_elapsed(&self) {
        let mut ready = Vec::new();
        {
            let mut pending = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            pending.retain(|_, p| {
                if p.first_seen.elapsed() >= self.config.debounce_window {
                    ready.push(p.update.clone());
                    false
                } else {
                    true
                }
            });
        }
        for update in ready {
            if self.pipeline.submit(InputEvent::StatusUpdate(update)).is_err() {
                warn!("debounced status update dropped: input queue full");
            }
        }
    }

    /// On leadership acquisition: lists every non-terminal instance in
    /// the current snapshot and asks the broker to reconcile against it.
    /// Any instance the broker reports back as unknown arrives later as
    /// an ordinary `StatusUpdate{condition=Gone}` through the normal
    /// debounce path.
    pub fn reconcile_on_leadership_acquired(&self) {
        let snapshot = self.pipeline.snapshot();
        let statuses: Vec<TaskStatus> = snapshot
            .instances_oldest_first()
            .into_iter()
            .filter(|instance| !instance.condition.is_terminal())
            .map(|instance| TaskStatus {
                task_id: authority_broker::task_id::encode(instance.id, instance.incarnation),
                condition: instance.condition,
                agent_id: instance.agent_id.clone(),
            })
            .collect();

        debug!(count = statuses.len(), "issuing explicit reconciliation");
        if let Err(err) = self.broker.reconcile_tasks(&statuses) {
            warn!(%err, "explicit reconciliation call failed");
        }
    }
}

impl Drop for InstanceTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
