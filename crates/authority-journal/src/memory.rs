use std::sync::Mutex;

use authority_kernel::JournalDelta;

use crate::{Ack, Journal, JournalError};

/// A non-durable, in-process journal. Every append survives only as long
/// as the process runs — the right backend for tests and for
/// `highly-available: false` deployments where a restart is expected to
/// rebuild state from the broker's own reconciliation rather than from
/// disk.
#[derive(Debug, Default)]
pub struct InMemoryJournal {
    deltas: Mutex<Vec<JournalDelta>>,
}

impl InMemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Journal for InMemoryJournal {
    fn append(&self, deltas: &[JournalDelta]) -> Result<Ack, JournalError> {
        let mut guard = self.deltas.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.extend_from_slice(deltas);
        Ok(Ack {
            sequence: guard.len() as u64,
        })
    }

    fn replay(&self) -> Result<Vec<JournalDelta>, JournalError> {
        let guard = self.deltas.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(guard.clone())
    }
}
