//! Decoy flag dispenser
//!
//! Overwrites a fake flag file whenever bait is taken. Best-effort like the
//! bait log: failures warn and the process outcome is unchanged.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const DECOY_FLAG_CONTENT: &str = "flag{virtual_machine_this_is_not}\n";

/// Prefix stripped from the decoy path when it is shown in the bait log
const DISPLAY_STRIP_PREFIX: &str = "/app/";

#[derive(Debug, Clone)]
pub struct DecoyDispenser {
    path: PathBuf,
}

impl DecoyDispenser {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path as written into the bait log, relative to the application root
    pub fn display_path(&self) -> String {
        let full = self.path.to_string_lossy().into_owned();
        if let Some(rest) = full.strip_prefix(DISPLAY_STRIP_PREFIX) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
        full
    }

    /// Write the decoy, warning on failure.
    pub fn dispense(&self) {
        if let Err(e) = self.try_dispense() {
            eprintln!(
                "[tiny_vmmgr] Warning: unable to write fake flag at '{}': {}",
                self.path.display(),
                e
            );
            log::debug!("Decoy flag write failed: {}", e);
        }
    }

    pub fn try_dispense(&self) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(DECOY_FLAG_CONTENT.as_bytes())?;
        file.flush()
    }
}
