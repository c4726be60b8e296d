//! # authority-tracker: the Instance Tracker
//!
//! Sits between the broker adapter and the pipeline's input queue:
//! translates `BrokerEvent`s into `InputEvent`s, debounces status
//! floods per instance to a single update per 100ms window, reaps
//! broker tasks whose id doesn't decode to a known instance, and drives
//! bulk reconciliation when this process becomes leader.

mod tracker;

pub use tracker::{InstanceTracker, TrackerConfig};
