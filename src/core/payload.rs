use crate::config::types::PayloadOrigin;
use crate::safety::erase::{secure_erase, secure_erase_vec};
use std::fmt;

/// Owned payload bytes with a single owner at any time.
///
/// There is deliberately no `Clone`. Ownership moves from acquisition to the
/// inspector and then to the execution engine; whichever step drops the
/// buffer wipes every byte of the backing allocation first.
pub struct PayloadBuffer {
    data: Vec<u8>,
    origin: PayloadOrigin,
}

impl PayloadBuffer {
    pub fn new(data: Vec<u8>, origin: PayloadOrigin) -> Self {
        Self { data, origin }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn origin(&self) -> PayloadOrigin {
        self.origin
    }

    pub fn from_stdin(&self) -> bool {
        self.origin == PayloadOrigin::Stdin
    }

    /// True if any byte is 0x00
    pub fn contains_nul(&self) -> bool {
        self.data.contains(&0)
    }

    /// Zero the payload bytes in place without releasing them.
    pub fn wipe(&mut self) {
        secure_erase(&mut self.data);
    }

    /// Erase and free the backing memory.
    pub fn release(self) {
        log::debug!("Releasing {} byte payload from {}", self.len(), self.origin);
        drop(self);
    }
}

impl Drop for PayloadBuffer {
    fn drop(&mut self) {
        secure_erase_vec(&mut self.data);
    }
}

impl fmt::Debug for PayloadBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadBuffer")
            .field("length", &self.data.len())
            .field("origin", &self.origin)
            .finish()
    }
}
