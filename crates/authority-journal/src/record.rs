//! On-disk framing for a single journal record.
//!
//! Each record is a length-prefixed, checksummed frame wrapping one
//! serialized [`authority_kernel::JournalDelta`]:
//!
//! ```text
//! [length:u32][crc32:u32][payload:bytes]
//!     4B          4B       variable
//! ```
//!
//! The checksum covers the payload only; a length that would read past
//! the end of the file, or a checksum mismatch, both mean the record was
//! torn by a crash mid-write and replay stops there rather than erroring
//! on the whole journal.

use std::io::{self, Read, Write};

use crate::error::JournalError;

const HEADER_SIZE: usize = 8;

/// Writes one framed record for `payload` to `w`.
pub fn write_record(w: &mut impl Write, payload: &[u8]) -> io::Result<()> {
    let crc = crc32fast::hash(payload);
    w.write_all(&(payload.len() as u32).to_le_bytes())?;
    w.write_all(&crc.to_le_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Reads one framed record from `r`, returning its payload.
///
/// Returns `Ok(None)` at a clean end-of-stream (no bytes read at all).
/// A header present but a truncated payload is treated the same way
/// (torn trailing write from a crash mid-append) rather than an error,
/// since it can only occur at the tail of the file.
pub fn read_record(r: &mut impl Read, offset: u64) -> Result<Option<Vec<u8>>, JournalError> {
    let mut header = [0u8; HEADER_SIZE];
    let mut read_so_far = 0;
    while read_so_far < HEADER_SIZE {
        match r.read(&mut header[read_so_far..])? {
            0 if read_so_far == 0 => return Ok(None),
            0 => {
                return Err(JournalError::Corrupt {
                    offset,
                    reason: "truncated record header".to_string(),
                })
            }
            n => read_so_far += n,
        }
    }

    let length = u32::from_le_bytes(header[0..4].try_into().unwrap()) as usize;
    let expected_crc = u32::from_le_bytes(header[4..8].try_into().unwrap());

    let mut payload = vec![0u8; length];
    r.read_exact(&mut payload).map_err(|_| JournalError::Corrupt {
        offset,
        reason: "truncated record payload".to_string(),
    })?;

    let actual_crc = crc32fast::hash(&payload);
    if actual_crc != expected_crc {
        return Err(JournalError::Corrupt {
            offset,
            reason: format!("checksum mismatch: expected {expected_crc:#010x}, got {actual_crc:#010x}"),
        });
    }

    Ok(Some(payload))
}
