//! Bait Logger
//!
//! Best-effort, append-only forensic record of signature hits. Each event is
//! rendered into one buffer and written with a single `write_all` on an
//! `O_APPEND` descriptor, so concurrent harness processes interleave at line
//! granularity without locking. Failures are reported on stderr and never
//! change the outcome already decided by the inspector.

use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::HarnessConfig;

/// Bytes shown in the hex preview
pub const PREVIEW_BYTES: usize = 16;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Transient record of a single detection
#[derive(Debug, Clone)]
pub struct BaitEvent {
    pub signature: String,
    pub length: usize,
    pub preview: String,
    pub timestamp: DateTime<Utc>,
}

impl BaitEvent {
    /// Capture an event for `payload`, stamped now
    pub fn capture(signature: &str, payload: &[u8]) -> Self {
        Self::at(signature, payload, Utc::now())
    }

    pub fn at(signature: &str, payload: &[u8], timestamp: DateTime<Utc>) -> Self {
        let signature = if signature.is_empty() {
            "unknown".to_string()
        } else {
            signature.to_string()
        };
        Self {
            signature,
            length: payload.len(),
            preview: hex_preview(payload),
            timestamp,
        }
    }

    /// Render the log lines for this event, newline-terminated.
    pub fn render(&self, component: &str, decoy_display: Option<&str>) -> String {
        let ts = self.timestamp.format(TIMESTAMP_FORMAT);
        let mut out = format!(
            "[BAIT] [{component}] Pattern '{}' detected in payload (length={}) at {ts}\n\
             [BAIT] [{component}] Payload hex dump: {} at {ts}\n",
            self.signature, self.length, self.preview
        );
        if let Some(display) = decoy_display {
            out.push_str(&format!(
                "[BAIT] [{component}] Fake flag dispensed at {display} at {ts}\n"
            ));
        }
        out
    }
}

/// Lower-case hex of the first [`PREVIEW_BYTES`] bytes, `...` when truncated
pub fn hex_preview(payload: &[u8]) -> String {
    if payload.is_empty() {
        return "(empty)".to_string();
    }
    let shown = payload.len().min(PREVIEW_BYTES);
    let mut preview = payload[..shown]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ");
    if payload.len() > shown {
        preview.push_str(" ...");
    }
    preview
}

/// Why a bait event did not reach the log
#[derive(Error, Debug)]
pub enum BaitLogError {
    #[error("unable to open bait log at '{path}': {source}")]
    Open { path: String, source: io::Error },

    #[error("unable to write bait log at '{path}': {source}")]
    Write { path: String, source: io::Error },
}

/// Appends bait events to an injected log path
#[derive(Debug, Clone)]
pub struct BaitLogger {
    log_path: PathBuf,
    component: String,
}

impl BaitLogger {
    pub fn new<P: Into<PathBuf>>(log_path: P, component: &str) -> Self {
        Self {
            log_path: log_path.into(),
            component: component.to_string(),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.bait_log_path.clone(), &config.component_tag)
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Record `event`, swallowing any failure with a warning.
    pub fn record(&self, event: &BaitEvent, decoy_display: Option<&str>) {
        match self.try_record(event, decoy_display) {
            Ok(()) => log::info!(
                "Bait event '{}' appended to {}",
                event.signature,
                self.log_path.display()
            ),
            Err(e) => {
                eprintln!("[tiny_vmmgr] Warning: {}", e);
                log::debug!("Bait event '{}' dropped", event.signature);
            }
        }
    }

    /// Record `event`, surfacing the failure to the caller
    pub fn try_record(
        &self,
        event: &BaitEvent,
        decoy_display: Option<&str>,
    ) -> std::result::Result<(), BaitLogError> {
        let mut file = self.open().map_err(|source| BaitLogError::Open {
            path: self.log_path.display().to_string(),
            source,
        })?;
        write_event(&mut file, &self.component, event, decoy_display).map_err(|source| {
            BaitLogError::Write {
                path: self.log_path.display().to_string(),
                source,
            }
        })
    }

    fn open(&self) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
    }
}

/// Write one rendered event to any sink in a single call
pub fn write_event<W: Write>(
    writer: &mut W,
    component: &str,
    event: &BaitEvent,
    decoy_display: Option<&str>,
) -> io::Result<()> {
    let rendered = event.render(component, decoy_display);
    writer.write_all(rendered.as_bytes())?;
    writer.flush()
}
