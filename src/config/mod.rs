//! Configuration
//!
//! Shared types, the error taxonomy, and configuration loading.

pub mod loader;
pub mod types;
