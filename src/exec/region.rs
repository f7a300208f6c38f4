//! Executable region state machine
//!
//! One anonymous, process-private page per accepted payload:
//!
//! Unmapped -> Writable -> Executable -> Unmapped
//!
//! Each transition consumes the prior state and returns exactly one next
//! state. Only `Region<Writable>` accepts bytes and only `Region<Executable>`
//! exposes control transfer, so out-of-order use does not compile:
//!
//! ```compile_fail
//! use vmmgr::exec::region::{Region, Writable};
//!
//! let region = Region::<Writable>::map().unwrap();
//! unsafe { region.transfer_control() };
//! ```
//!
//! ```compile_fail
//! use vmmgr::config::types::RegionPolicy;
//! use vmmgr::exec::region::{Region, Writable};
//!
//! let mut region = Region::<Writable>::map().unwrap()
//!     .make_executable(RegionPolicy::ReadWriteExecute)
//!     .unwrap();
//! region.copy_in(&[0xc3]).unwrap();
//! ```
//!
//! ```compile_fail
//! use vmmgr::config::types::RegionPolicy;
//! use vmmgr::exec::region::{Region, Writable};
//!
//! let region = Region::<Writable>::map().unwrap();
//! let exec = region.make_executable(RegionPolicy::ReadExecute).unwrap();
//! let again = region.make_executable(RegionPolicy::ReadExecute);
//! ```

use crate::config::types::{HarnessError, RegionPolicy, Result};
use nix::sys::mman::{mmap_anonymous, mprotect, munmap, MapFlags, ProtFlags};
use std::ffi::c_void;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::ptr::NonNull;

/// Type-state marker: mapped read/write, accepting the payload copy
pub struct Writable;

/// Type-state marker: protection escalated, ready for control transfer
pub struct Executable;

/// Fallback when sysconf cannot report a page size
const FALLBACK_PAGE_SIZE: usize = 4096;

/// Platform page size in bytes
pub fn page_size() -> usize {
    let raw = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if raw > 0 {
        raw as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// An anonymous private mapping in state `S`.
///
/// Dropping a region unmaps it. A region whose payload never returns is
/// simply never dropped.
pub struct Region<S> {
    base: NonNull<c_void>,
    len: usize,
    used: usize,
    _state: PhantomData<S>,
}

impl Region<Writable> {
    /// Map exactly one platform page with read/write access.
    pub fn map() -> Result<Self> {
        let len = page_size();
        let length = NonZeroUsize::new(len)
            .ok_or_else(|| HarnessError::Allocation("zero-length region".to_string()))?;

        let base = unsafe {
            mmap_anonymous(
                None,
                length,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_PRIVATE | MapFlags::MAP_ANONYMOUS,
            )
        }
        .map_err(|e| HarnessError::Allocation(format!("mmap: {}", e)))?;

        log::debug!("Mapped {} byte RW region at {:p}", len, base.as_ptr());
        Ok(Self {
            base,
            len,
            used: 0,
            _state: PhantomData,
        })
    }

    /// Copy `bytes` to the start of the region.
    pub fn copy_in(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.len {
            return Err(HarnessError::Allocation(format!(
                "payload of {} bytes does not fit a {} byte region",
                bytes.len(),
                self.len
            )));
        }
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.base.as_ptr() as *mut u8, bytes.len());
        }
        self.used = bytes.len();
        Ok(())
    }

    /// Escalate protection so the region can be executed.
    ///
    /// On failure the region is unmapped before the error is returned.
    pub fn make_executable(self, policy: RegionPolicy) -> Result<Region<Executable>> {
        let prot = match policy {
            RegionPolicy::ReadWriteExecute => {
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE | ProtFlags::PROT_EXEC
            }
            RegionPolicy::ReadExecute => ProtFlags::PROT_READ | ProtFlags::PROT_EXEC,
        };

        unsafe { mprotect(self.base, self.len, prot) }
            .map_err(|e| HarnessError::Permission(format!("mprotect: {}", e)))?;

        log::debug!("Region at {:p} escalated to {:?}", self.base.as_ptr(), policy);
        Ok(self.transition())
    }
}

impl Region<Executable> {
    /// Jump to the first byte of the region as `extern "C" fn()`.
    ///
    /// # Safety
    ///
    /// The region must hold machine code for the running architecture that
    /// follows the C calling convention if it intends to return. Nothing
    /// the code does afterwards is supervised; it may never come back.
    pub unsafe fn transfer_control(&self) {
        let entry: unsafe extern "C" fn() = std::mem::transmute(self.base.as_ptr());
        entry();
    }
}

impl<S> Region<S> {
    /// Total mapped length in bytes
    pub fn mapped_len(&self) -> usize {
        self.len
    }

    /// Number of payload bytes copied in
    pub fn used(&self) -> usize {
        self.used
    }

    /// Read back the mapped bytes (every state keeps PROT_READ)
    pub fn contents(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.base.as_ptr() as *const u8, self.len) }
    }

    /// Tear the mapping down (-> Unmapped).
    pub fn unmap(self) -> Result<()> {
        let base = self.base;
        let len = self.len;
        std::mem::forget(self);
        unsafe { munmap(base, len) }
            .map_err(|e| HarnessError::Allocation(format!("munmap: {}", e)))
    }

    fn transition<T>(self) -> Region<T> {
        let next = Region {
            base: self.base,
            len: self.len,
            used: self.used,
            _state: PhantomData,
        };
        std::mem::forget(self);
        next
    }
}

impl<S> Drop for Region<S> {
    fn drop(&mut self) {
        if let Err(e) = unsafe { munmap(self.base, self.len) } {
            log::warn!("munmap of region at {:p} failed: {}", self.base.as_ptr(), e);
        }
    }
}
