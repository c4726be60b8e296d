//! # authority: the state authority facade
//!
//! Wires every component crate into a runnable single-process pipeline:
//! [`authority_config`] for layered configuration, [`authority_journal`]
//! for durability, [`authority_broker`] for the broker boundary,
//! [`authority_reconciler`] for offer matching (used internally by
//! [`authority_runtime::Pipeline`]), [`authority_tracker`] for status
//! debouncing and orphan reaping, and [`authority_leadership`] for the
//! leadership gate.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use authority_broker::{BrokerDriver, LoggingBrokerDriver};
use authority_config::Config;
use authority_journal::{FileJournal, InMemoryJournal, Journal};
use authority_leadership::{LeadershipGate, LeadershipSource, SingleProcessLeadership};
use authority_runtime::{CrashStrategy, Pipeline, PipelineConfig, RecordingEffectSink, SystemClock};
use authority_tracker::{InstanceTracker, TrackerConfig};

/// A fully wired, running authority: the pipeline, its tracker, and its
/// leadership gate, kept alive together. Dropping this shuts everything
/// down in dependency order (tracker, then gate's pipeline handle).
pub struct Authority {
    pub pipeline: Arc<Pipeline>,
    pub tracker: Arc<InstanceTracker>,
    pub leadership: LeadershipGate,
}

impl Authority {
    /// Starts the full pipeline against `journal_path` (or purely
    /// in-memory, when `journal_path` is `None` — the `highly-available:
    /// false` development mode).
    pub fn start(config: &Config, journal_path: Option<PathBuf>) -> Result<Self> {
        let journal: Arc<dyn Journal> = match journal_path {
            Some(path) => Arc::new(FileJournal::open(path)?),
            None => Arc::new(InMemoryJournal::new()),
        };

        let broker: Arc<dyn BrokerDriver> = Arc::new(LoggingBrokerDriver);
        let clock = Arc::new(SystemClock);
        let sink = Arc::new(RecordingEffectSink::new());
        let crash_strategy = Arc::new(CrashStrategy::new());

        let pipeline_config = PipelineConfig {
            queue_capacity: config.command_queue_capacity,
            reconcile: authority_reconciler::ReconcileConfig {
                refuse_offer_seconds: config.refuse_offer_seconds,
            },
            min_broker_version: semver::Version::parse(&config.min_broker_version)
                .context("min_broker_version must be valid semver; Config::validate should have caught this")?,
        };

        let pipeline = Arc::new(Pipeline::start(
            pipeline_config,
            journal,
            Arc::clone(&broker),
            clock,
            sink,
            crash_strategy,
        )?);

        let tracker = InstanceTracker::start(Arc::clone(&pipeline), Arc::clone(&broker), TrackerConfig::default());

        let leadership_source: Arc<dyn LeadershipSource> = if config.highly_available {
            anyhow::bail!(
                "highly-available leadership requires a FencedLeadershipClient implementation; none is wired here"
            );
        } else {
            Arc::new(SingleProcessLeadership)
        };
        let leadership = LeadershipGate::start(Arc::clone(&pipeline), leadership_source)?;

        Ok(Self {
            pipeline,
            tracker,
            leadership,
        })
    }

    pub fn shutdown(&self) {
        self.tracker.shutdown();
        self.pipeline.shutdown();
    }
}
