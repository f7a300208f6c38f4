//! vmmgr: single-shot shellcode harness for the ISOL8R pipeline
//!
//! Accepts one untrusted payload, screens it against a fixed list of bait
//! signatures, and if it is clean maps it into executable memory and jumps
//! to it.
//!
//! # Architecture
//!
//! Modules are laid out in the order a payload flows through them:
//!
//! ## Payload Core ([`core`])
//! - [`core::acquisition`]: Bounded read from stdin or a named file
//! - [`core::payload`]: Single-owner payload buffer, erased on release
//!
//! ## Verdict ([`verdict`])
//! - [`verdict::signatures`]: The five priority-ordered bait signatures
//! - [`verdict::inspector`]: First-match-wins inspection and detection handling
//!
//! ## Observability ([`observability`])
//! - [`observability::bait`]: Append-only forensic bait log
//! - [`observability::decoy`]: Decoy flag dispensed on detection
//!
//! ## Execution Control ([`exec`])
//! - [`exec::region`]: Type-state region (Writable -> Executable -> Unmapped)
//! - [`exec::engine`]: Stage, escalate, and transfer control
//!
//! ## Safety ([`safety`])
//! - [`safety::erase`]: Secure erase of payload bytes
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Error taxonomy and `HarnessConfig`
//! - [`config::loader`]: JSON file and environment overrides
//!
//! # Design Principles
//!
//! 1. **Fixed detection contract** - Same payload, same signature, every time
//! 2. **Single owner** - Payload bytes are wiped by whoever drops them
//! 3. **Types prevent errors** - A region cannot run before it is executable
//! 4. **Minimal unsafe** - Control transfer is one narrow unsafe call
//! 5. **Logging never decides** - Log failures warn and change nothing

// Payload Core
pub mod core;

// Evidence & Verdict
pub mod verdict;

// Observability
pub mod observability;

// Execution Control
pub mod exec;

// Safety
pub mod safety;

// Configuration
pub mod config;

// CLI entrypoint wiring for the harness binary.
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::*;
pub use exec::region;
