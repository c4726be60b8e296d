use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use authority_kernel::JournalDelta;
use tracing::{info, warn};

use crate::error::JournalError;
use crate::record::{read_record, write_record};
use crate::{Ack, Journal};

/// A durable, append-only journal backed by a single local-disk file.
///
/// Each record is length-prefixed and checksummed (see [`crate::record`]),
/// so a crash mid-write leaves at most one torn trailing record, which
/// [`FileJournal::open`] detects and truncates away on recovery rather
/// than treating the whole journal as corrupt.
pub struct FileJournal {
    path: PathBuf,
    writer: Mutex<File>,
    sequence: AtomicU64,
}

impl FileJournal {
    /// Opens (creating if absent) the journal file at `path`, recovering
    /// from any torn trailing write left by a crash during the previous
    /// process's last `append`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();

        OpenOptions::new().create(true).append(true).open(&path)?;

        let (valid_len, count) = Self::scan_and_recover(&path)?;

        let mut file = OpenOptions::new().write(true).open(&path)?;
        file.set_len(valid_len)?;
        file.seek(SeekFrom::End(0))?;

        let writer = OpenOptions::new().append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(writer),
            sequence: AtomicU64::new(count),
        })
    }

    /// Reads every record from the start of the file, stopping at the
    /// first clean end-of-stream or the first torn/corrupt record.
    /// Returns the byte length of the valid prefix and the record count
    /// within it, so the caller can truncate away anything past it.
    fn scan_and_recover(path: &Path) -> Result<(u64, u64), JournalError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut offset: u64 = 0;
        let mut count: u64 = 0;

        loop {
            match read_record(&mut reader, offset) {
                Ok(Some(payload)) => {
                    offset += 8 + payload.len() as u64;
                    count += 1;
                }
                Ok(None) => break,
                Err(JournalError::Corrupt { reason, .. }) => {
                    warn!(%reason, %offset, "journal truncated at torn or corrupt record, recovering");
                    break;
                }
                Err(other) => return Err(other),
            }
        }

        info!(count, offset, path = %path.display(), "journal recovery scan complete");
        Ok((offset, count))
    }
}

impl Journal for FileJournal {
    fn append(&self, deltas: &[JournalDelta]) -> Result<Ack, JournalError> {
        let mut batch = Vec::new();
        for delta in deltas {
            let payload = serde_json::to_vec(delta)?;
            write_record(&mut batch, &payload)?;
        }

        let mut writer = self.writer.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        writer.write_all(&batch)?;
        writer.flush()?;
        writer.sync_data()?;

        let sequence = self.sequence.fetch_add(deltas.len() as u64, Ordering::SeqCst) + deltas.len() as u64;
        Ok(Ack { sequence })
    }

    fn replay(&self) -> Result<Vec<JournalDelta>, JournalError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut offset: u64 = 0;
        let mut deltas = Vec::new();

        while let Some(payload) = read_record(&mut reader, offset)? {
            offset += 8 + payload.len() as u64;
            let delta: JournalDelta = serde_json::from_slice(&payload)?;
            deltas.push(delta);
        }
        Ok(deltas)
    }
}
