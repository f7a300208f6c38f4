//! Execution Engine
//!
//! Copies a clean payload into a fresh anonymous page, erases the source
//! buffer straight away, escalates the page to executable, and jumps to it.
//! Control transfer is the only unsafe step and lives in
//! [`Region::transfer_control`]; everything before it is exercised by tests
//! without executing anything.

use crate::config::types::{HarnessConfig, HarnessError, RegionPolicy, Result};
use crate::core::payload::PayloadBuffer;
use crate::exec::region::{Executable, Region, Writable};

pub const NUL_BYTE_WARNING: &str =
    "[tiny_vmmgr] Caution: payload contains null bytes. Hope your loader likes NULs.";

/// A payload staged in an executable region, source buffer already erased
pub struct StagedPayload {
    pub region: Region<Executable>,
    pub contains_nul: bool,
}

pub struct ExecutionEngine {
    policy: RegionPolicy,
}

impl ExecutionEngine {
    pub fn new(policy: RegionPolicy) -> Self {
        Self { policy }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.region_policy)
    }

    /// Map, copy, erase, escalate. Emits the embedded-NUL caution.
    pub fn stage(&self, payload: PayloadBuffer) -> Result<StagedPayload> {
        if payload.is_empty() {
            payload.release();
            return Err(HarnessError::EmptyPayload);
        }

        let contains_nul = payload.contains_nul();

        let mut region = match Region::<Writable>::map() {
            Ok(region) => region,
            Err(e) => {
                payload.release();
                return Err(e);
            }
        };

        let copied = region.copy_in(payload.as_bytes());
        // Both copies coexist only between copy_in and here.
        payload.release();
        copied?;

        let region = region.make_executable(self.policy)?;

        if contains_nul {
            eprintln!("{}", NUL_BYTE_WARNING);
            log::debug!("Executing payload with embedded NUL bytes");
        }

        Ok(StagedPayload {
            region,
            contains_nul,
        })
    }

    /// Stage the payload and transfer control to it.
    ///
    /// Returns only if the payload returns; the region is then unmapped.
    pub fn run(&self, payload: PayloadBuffer) -> Result<()> {
        let staged = self.stage(payload)?;
        log::info!(
            "Transferring control to {} byte payload",
            staged.region.used()
        );

        // SAFETY: the inspector accepted these bytes for execution; the
        // harness makes no promises beyond handing over the CPU.
        unsafe { staged.region.transfer_control() };

        log::info!("Payload returned, tearing down region");
        if let Err(e) = staged.region.unmap() {
            log::warn!("Region teardown failed: {}", e);
        }
        Ok(())
    }
}
