use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Enumerated, user-visible reason a command was not applied. Never
/// raised for infrastructure-internal invariant violations — those are
/// fatal and escalate to the crash strategy instead (see
/// `authority-runtime::crash`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum RejectionKind {
    #[error("no such run-spec")]
    NoRunSpec,
    #[error("run-spec is still referenced by an instance")]
    RunSpecInUse,
    #[error("invalid run-spec reference")]
    InvalidRef,
    #[error("instance with this id already exists")]
    DuplicateInstance,
    #[error("no such instance")]
    NoSuchInstance,
    #[error("goal transition is not monotone")]
    InvalidGoalTransition,
    #[error("instance is not in a terminal condition")]
    InstanceNotTerminal,
    #[error("leadership was lost")]
    LeadershipLost,
    #[error("persistence is unavailable")]
    PersistenceUnavailable,
    #[error("input queue is full")]
    QueueFull,
    #[error("authority is shutting down")]
    ShuttingDown,
}

/// A rejected command's full user-facing payload: the enumerated kind
/// plus a free-text reason for operator consumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}
