use thiserror::Error;

/// A transport-level failure calling out to the broker. These are logged
/// and retried with bounded exponential backoff by the caller; they
/// never surface directly as a [`authority_types::Rejection`].
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker transport error: {0}")]
    Transport(String),

    #[error("broker rejected the call: {0}")]
    Rejected(String),

    #[error("not currently registered with the broker")]
    NotRegistered,
}
