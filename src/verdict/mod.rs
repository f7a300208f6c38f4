//! Verdict
//!
//! Fixed-priority bait signatures and the inspector that applies them.

pub mod inspector;
pub mod signatures;
