//! The Leadership Gate: wires a [`LeadershipSource`] to the pipeline.
//!
//! On `Acquired`, submits `InputEvent::LeadershipAcquired` so the
//! pipeline rebuilds its snapshot from the journal before accepting
//! commands. On `Lost`, submits `InputEvent::LeadershipLost`; the
//! pipeline itself is responsible for draining in-flight work with
//! `CommandFailure{LeadershipLost}` from that point on — the gate
//! only forwards the signal, it doesn't drain anything itself.

use std::sync::Arc;

use tracing::{info, warn};

use authority_runtime::{InputEvent, Pipeline};

use crate::source::{LeadershipError, LeadershipEvent, LeadershipSource};

pub struct LeadershipGate {
    pipeline: Arc<Pipeline>,
}

impl LeadershipGate {
    /// Subscribes `source` immediately, forwarding every leadership
    /// transition to `pipeline` for the remaining life of the process.
    pub fn start(pipeline: Arc<Pipeline>, source: Arc<dyn LeadershipSource>) -> Result<Self, LeadershipError> {
        let gate_pipeline = Arc::clone(&pipeline);
        source.subscribe(Arc::new(move |event| match event {
            LeadershipEvent::Acquired => {
                info!("leadership acquired");
                if gate_pipeline.submit(InputEvent::LeadershipAcquired).is_err() {
                    warn!("leadership-acquired signal dropped: input queue full");
                }
            }
            LeadershipEvent::Lost => {
                info!("leadership lost");
                if gate_pipeline.submit(InputEvent::LeadershipLost).is_err() {
                    warn!("leadership-lost signal dropped: input queue full");
                }
            }
        }))?;

        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }
}
