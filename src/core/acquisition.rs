//! Input Acquisition
//!
//! Reads a length-bounded payload from stdin or a named file. Reads stop one
//! byte past the limit so an exactly-full payload is accepted while anything
//! larger is rejected without handing a partial buffer onward.
//!
//! Standard input is read through a duplicate of the raw descriptor rather
//! than `io::stdin()`, whose process-wide read-ahead buffer would keep a copy
//! of the payload that nothing ever erases.

use crate::config::types::{HarnessError, PayloadOrigin, Result};
use crate::core::payload::PayloadBuffer;
use crate::safety::erase::secure_erase_vec;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::os::fd::AsFd;
use std::path::PathBuf;

/// Argument that explicitly selects standard input
pub const STDIN_MARKER: &str = "-";

/// Where the payload comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// Resolve positional arguments (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Self> {
        match args {
            [] => Ok(InputSource::Stdin),
            [single] if single == STDIN_MARKER => Ok(InputSource::Stdin),
            [single] => Ok(InputSource::File(PathBuf::from(single))),
            _ => Err(HarnessError::Usage(format!(
                "expected at most one input argument, got {}",
                args.len()
            ))),
        }
    }

    pub fn origin(&self) -> PayloadOrigin {
        match self {
            InputSource::Stdin => PayloadOrigin::Stdin,
            InputSource::File(_) => PayloadOrigin::File,
        }
    }
}

/// Open the source and read at most `limit` bytes from it.
pub fn acquire(source: &InputSource, limit: usize) -> Result<PayloadBuffer> {
    match source {
        InputSource::Stdin => read_descriptor(io::stdin(), limit, PayloadOrigin::Stdin),
        InputSource::File(path) => {
            let file = File::open(path).map_err(|e| {
                HarnessError::Input(io::Error::new(
                    e.kind(),
                    format!("Failed to open '{}': {}", path.display(), e),
                ))
            })?;
            read_payload(file, limit, PayloadOrigin::File)
        }
    }
}

/// Read up to `limit` bytes straight from `fd`, with no intermediate buffer.
///
/// Reads through a duplicated descriptor so nothing is consumed beyond the
/// one-byte overflow probe.
pub fn read_descriptor<F: AsFd>(fd: F, limit: usize, origin: PayloadOrigin) -> Result<PayloadBuffer> {
    let file = File::from(fd.as_fd().try_clone_to_owned()?);
    read_payload(file, limit, origin)
}

/// Read up to `limit` bytes from `reader`.
///
/// A zero-length result is returned as-is; rejecting it is the caller's job
/// (see [`ensure_non_empty`]).
pub fn read_payload<R: Read>(mut reader: R, limit: usize, origin: PayloadOrigin) -> Result<PayloadBuffer> {
    // One spare byte lets us tell "exactly full" from "still has data".
    let mut storage = vec![0u8; limit + 1];
    let mut total = 0usize;

    while total < storage.len() {
        match reader.read(&mut storage[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                secure_erase_vec(&mut storage);
                return Err(HarnessError::Input(e));
            }
        }
    }

    if total > limit {
        secure_erase_vec(&mut storage);
        return Err(HarnessError::Oversized { limit });
    }

    storage.truncate(total);
    log::debug!("Acquired {} byte payload from {}", total, origin);
    Ok(PayloadBuffer::new(storage, origin))
}

/// Reject an empty payload before inspection.
pub fn ensure_non_empty(payload: PayloadBuffer) -> Result<PayloadBuffer> {
    if payload.is_empty() {
        payload.release();
        return Err(HarnessError::EmptyPayload);
    }
    Ok(payload)
}
