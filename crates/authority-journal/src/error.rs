use thiserror::Error;

/// Failure modes for journal `append` and `replay`.
///
/// `Io` and `Corrupt` are infrastructure-fatal: the pipeline that owns
/// this journal escalates them to the crash strategy rather than
/// surfacing them as a per-command [`authority_types::Rejection`].
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("journal record corrupt at byte offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    #[error("journal is closed")]
    Closed,
}
