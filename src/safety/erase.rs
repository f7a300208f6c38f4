//! Secure erase of payload bytes
//!
//! Writes go through `zeroize`, which uses volatile stores plus a compiler
//! fence so the wipe survives dead-store elimination right before a free.

use zeroize::Zeroize;

/// Overwrite `region` with zeros in place. Length is unchanged.
pub fn secure_erase(region: &mut [u8]) {
    if region.is_empty() {
        return;
    }
    region.zeroize();
}

/// Zero every byte a vector owns, spare capacity included, and truncate it.
pub fn secure_erase_vec(buffer: &mut Vec<u8>) {
    #[cfg(test)]
    let len = buffer.len();
    buffer.zeroize();
    #[cfg(test)]
    observer::note(len, buffer);
}

/// True when every byte of `region` is zero
pub fn is_erased(region: &[u8]) -> bool {
    region.iter().all(|&b| b == 0)
}
