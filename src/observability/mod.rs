//! Observability
//!
//! Forensic bait logging and the decoy flag dispensed on detection.

pub mod bait;
pub mod decoy;
