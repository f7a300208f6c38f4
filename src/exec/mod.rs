//! Execution control
//!
//! Type-state executable region and the engine that stages and runs payloads.

pub mod engine;
pub mod region;
