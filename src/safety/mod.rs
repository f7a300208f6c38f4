//! Safety
//!
//! Secure erase used by every exit path that has handled payload bytes.

pub mod erase;
