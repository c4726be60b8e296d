//! Leadership sources: who decides this process holds the lease.
//!
//! The authority itself only needs one guarantee from whatever it plugs
//! in here: at most one process observes `Acquired` at any wall-clock
//! instant, modulo bounded clock skew the source fences against itself
//! This crate ships the trivial single-process source; a
//! coordinator-backed one is a boundary, not an implementation.

use std::sync::Arc;

use thiserror::Error;

/// A leadership state transition as observed by a [`LeadershipSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadershipEvent {
    Acquired,
    Lost,
}

#[derive(Debug, Error)]
pub enum LeadershipError {
    #[error("leadership source unavailable: {0}")]
    Unavailable(String),
}

/// Something the Leadership Gate can subscribe to for acquire/lose
/// notifications. A source owns whatever background connection it needs
/// (a ZK session, an etcd lease) and calls `on_event` from its own
/// thread whenever the state changes.
pub trait LeadershipSource: Send + Sync {
    fn subscribe(&self, on_event: Arc<dyn Fn(LeadershipEvent) + Send + Sync>) -> Result<(), LeadershipError>;
}

/// Pseudo-leadership for `highly-available: false` single-process
/// operation: this process is leader from the moment it subscribes
/// until the process exits. No fencing is needed because there is only
/// ever one process.
#[derive(Debug, Default)]
pub struct SingleProcessLeadership;

impl LeadershipSource for SingleProcessLeadership {
    fn subscribe(&self, on_event: Arc<dyn Fn(LeadershipEvent) + Send + Sync>) -> Result<(), LeadershipError> {
        on_event(LeadershipEvent::Acquired);
        Ok(())
    }
}

/// The trait boundary for a coordinator-backed leadership source (ZK,
/// etcd, Consul). Campaigning for a lease, renewing it, and detecting
/// session loss are all coordinator-specific; this crate only commits to
/// the shape a fenced source must expose to plug into the Leadership
/// Gate. No implementation ships here.
pub trait FencedLeadershipClient: Send + Sync {
    /// Starts campaigning for leadership, calling `on_event` from a
    /// background thread/task as the lease is acquired, renewed, or
    /// lost. Returns once campaigning has started, not once leadership
    /// is first acquired.
    fn campaign(&self, on_event: Arc<dyn Fn(LeadershipEvent) + Send + Sync>) -> Result<(), LeadershipError>;
}
