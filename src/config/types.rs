//! Core types and structures for the vmmgr harness

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fixed payload cap in bytes. Not configurable.
pub const MAX_PAYLOAD_SIZE: usize = 4096;

/// Shared honeypot log, provisioned and rotated outside the harness.
pub const DEFAULT_BAIT_LOG_PATH: &str = "/app/logs/bait.log";

/// Decoy flag overwritten whenever bait is taken.
pub const DEFAULT_DECOY_FLAG_PATH: &str = "/app/data/fake_flags/vm_flag.txt";

/// Component tag written into every bait log line.
pub const DEFAULT_COMPONENT_TAG: &str = "VMMGR";

/// Where a payload was read from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadOrigin {
    /// Standard input (no argument or `-`)
    Stdin,
    /// A named file
    File,
}

impl fmt::Display for PayloadOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadOrigin::Stdin => write!(f, "stdin"),
            PayloadOrigin::File => write!(f, "file"),
        }
    }
}

/// Final protection applied to the executable region.
///
/// `ReadWriteExecute` keeps the write bit while granting execute. `ReadExecute`
/// is the stricter W^X variant that revokes write in the same step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionPolicy {
    #[default]
    ReadWriteExecute,
    ReadExecute,
}

/// Harness configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Append-only forensic log for bait events
    pub bait_log_path: PathBuf,
    /// Decoy flag written on detection (None disables the dispenser)
    pub decoy_flag_path: Option<PathBuf>,
    /// `<component>` field of bait log lines
    pub component_tag: String,
    /// Protection granted when the region becomes executable
    pub region_policy: RegionPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            bait_log_path: PathBuf::from(DEFAULT_BAIT_LOG_PATH),
            decoy_flag_path: Some(PathBuf::from(DEFAULT_DECOY_FLAG_PATH)),
            component_tag: DEFAULT_COMPONENT_TAG.to_string(),
            region_policy: RegionPolicy::default(),
        }
    }
}

impl HarnessConfig {
    /// Reject values the harness cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.bait_log_path.as_os_str().is_empty() {
            return Err(HarnessError::Config("bait_log_path must not be empty".to_string()));
        }
        if self.component_tag.trim().is_empty() {
            return Err(HarnessError::Config("component_tag must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Terminal harness failures. Every variant ends the process with exit code 1.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    Input(#[from] std::io::Error),

    #[error("Payload exceeds {limit} bytes")]
    Oversized { limit: usize },

    #[error("Empty payload provided")]
    EmptyPayload,

    #[error("Payload blocked by signature '{signature}'")]
    DetectionBlock { signature: &'static str },

    #[error("Allocation error: {0}")]
    Allocation(String),

    #[error("Permission error: {0}")]
    Permission(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }

    /// Whether this is an intended detection outcome rather than a defect
    pub fn is_detection(&self) -> bool {
        matches!(self, HarnessError::DetectionBlock { .. })
    }
}

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HarnessConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.component_tag, "VMMGR");
        assert_eq!(config.region_policy, RegionPolicy::ReadWriteExecute);
    }

    #[test]
    fn test_blank_component_tag_rejected() {
        let config = HarnessConfig {
            component_tag: "  ".to_string(),
            ..HarnessConfig::default()
        };
        assert!(matches!(config.validate(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_payload_cap_is_not_a_config_field() {
        let result: std::result::Result<HarnessConfig, _> =
            serde_json::from_str(r#"{ "max_payload_size": 1048576 }"#);
        assert!(result.is_err());
        assert_eq!(MAX_PAYLOAD_SIZE, 4096);
    }

    #[test]
    fn test_every_error_exits_with_failure() {
        let errors = vec![
            HarnessError::Input(std::io::Error::new(std::io::ErrorKind::Other, "boom")),
            HarnessError::Oversized { limit: 4096 },
            HarnessError::EmptyPayload,
            HarnessError::DetectionBlock { signature: "flag" },
            HarnessError::Allocation("mmap".to_string()),
            HarnessError::Permission("mprotect".to_string()),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), EXIT_FAILURE, "{}", err);
        }
    }

    #[test]
    fn test_only_detection_is_detection() {
        assert!(HarnessError::DetectionBlock { signature: "execve" }.is_detection());
        assert!(!HarnessError::EmptyPayload.is_detection());
        assert!(!HarnessError::Oversized { limit: 1 }.is_detection());
    }

    #[test]
    fn test_region_policy_serde_names() {
        let json = serde_json::to_string(&RegionPolicy::ReadExecute).unwrap();
        assert_eq!(json, "\"read_execute\"");
    }
}
