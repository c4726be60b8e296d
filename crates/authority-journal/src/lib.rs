//! # authority-journal: durable persistence for the state authority
//!
//! The journal is an append-only ordered log of [`authority_kernel::JournalDelta`]
//! values. It never stores effects or broker state — only the deltas the
//! kernel produced, so that `replay` followed by
//! [`authority_kernel::delta::fold_all`] reconstructs the exact snapshot
//! the authority held before it last stopped.
//!
//! Two implementations are provided:
//! - [`InMemoryJournal`] for tests and `highly-available: false` single-process
//!   operation where durability across process restarts is not required.
//! - [`FileJournal`] for a durable local-disk backend: an append-only,
//!   length-prefixed, checksummed record file.

mod error;
mod file;
mod memory;
mod record;

pub use error::JournalError;
pub use file::FileJournal;
pub use memory::InMemoryJournal;

use authority_kernel::JournalDelta;

/// Acknowledgement returned by a successful [`Journal::append`]: the
/// sequence number of the last delta in the batch, now durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub sequence: u64,
}

/// An append-only, ordered log of state deltas.
///
/// `append` is atomic over its whole batch: either every delta in it
/// becomes durable, or none does — "journal writes for a single
/// command are atomic"). Implementations must be safe to call from the
/// single pipeline worker thread that owns them; no implementation here
/// is required to support concurrent writers.
pub trait Journal: Send + Sync {
    /// Durably appends `deltas` as one atomic batch, returning an ack
    /// once every delta in it is safe to survive a restart.
    fn append(&self, deltas: &[JournalDelta]) -> Result<Ack, JournalError>;

    /// Returns every previously appended delta in write order. Used once
    /// at startup (or on `LeadershipAcquired`) to rebuild the snapshot by
    /// folding from the empty state.
    fn replay(&self) -> Result<Vec<JournalDelta>, JournalError>;
}
