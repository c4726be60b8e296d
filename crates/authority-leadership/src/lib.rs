//! # authority-leadership: the Leadership Gate
//!
//! The pipeline only ever runs with one process believing it is leader.
//! This crate owns the subscription to whatever decides that —
//! [`SingleProcessLeadership`] for `highly-available: false` operation,
//! or a coordinator-backed [`FencedLeadershipClient`] for the
//! highly-available case — and forwards acquire/lose transitions into
//! the pipeline's input stream via [`LeadershipGate`].

mod gate;
mod source;

pub use gate::LeadershipGate;
pub use source::{FencedLeadershipClient, LeadershipError, LeadershipEvent, LeadershipSource, SingleProcessLeadership};
