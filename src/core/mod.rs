//! Payload core
//!
//! The owned payload buffer and its bounded acquisition.

pub mod acquisition;
pub mod payload;
