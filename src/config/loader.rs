//! Configuration loading from an optional JSON file plus environment overrides

use crate::config::types::{HarnessConfig, HarnessError, Result};
use std::path::{Path, PathBuf};

/// Names a JSON file holding a (partial) `HarnessConfig`
pub const CONFIG_PATH_ENV: &str = "VMMGR_CONFIG";

/// Overrides `bait_log_path`
pub const BAIT_LOG_ENV: &str = "VMMGR_BAIT_LOG";

/// Overrides `decoy_flag_path`; an empty value disables the dispenser
pub const DECOY_FLAG_ENV: &str = "VMMGR_DECOY_FLAG";

impl HarnessConfig {
    /// Load configuration from a JSON file. Missing fields keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            HarnessError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    /// Defaults, then `VMMGR_CONFIG`, then the per-field environment overrides.
    pub fn from_env() -> Result<Self> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Same as [`HarnessConfig::from_env`] with an injectable variable lookup
    pub fn resolve<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => {
                log::debug!("Loading harness config from {}", path);
                Self::load_from_file(&path)?
            }
            _ => Self::default(),
        };

        if let Some(log_path) = lookup(BAIT_LOG_ENV) {
            if !log_path.is_empty() {
                config.bait_log_path = PathBuf::from(log_path);
            }
        }

        if let Some(decoy) = lookup(DECOY_FLAG_ENV) {
            config.decoy_flag_path = if decoy.is_empty() {
                None
            } else {
                Some(PathBuf::from(decoy))
            };
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::RegionPolicy;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_without_env_uses_defaults() {
        let config = HarnessConfig::resolve(lookup_from(&[])).unwrap();
        assert_eq!(config.bait_log_path, PathBuf::from("/app/logs/bait.log"));
        assert!(config.decoy_flag_path.is_some());
    }

    #[test]
    fn test_env_overrides_paths() {
        let config = HarnessConfig::resolve(lookup_from(&[
            (BAIT_LOG_ENV, "/tmp/bait-test.log"),
            (DECOY_FLAG_ENV, ""),
        ]))
        .unwrap();
        assert_eq!(config.bait_log_path, PathBuf::from("/tmp/bait-test.log"));
        assert_eq!(config.decoy_flag_path, None);
    }

    #[test]
    fn test_partial_json_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmmgr.json");
        std::fs::write(
            &path,
            r#"{ "component_tag": "LAB", "region_policy": "read_execute" }"#,
        )
        .unwrap();

        let config = HarnessConfig::resolve(lookup_from(&[(
            CONFIG_PATH_ENV,
            path.to_str().unwrap(),
        )]))
        .unwrap();
        assert_eq!(config.component_tag, "LAB");
        assert_eq!(config.region_policy, RegionPolicy::ReadExecute);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = HarnessConfig::load_from_file(&path);
        assert!(matches!(result, Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_file_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.json");
        std::fs::write(&path, r#"{ "component_tag": "" }"#).unwrap();

        let result = HarnessConfig::resolve(lookup_from(&[(
            CONFIG_PATH_ENV,
            path.to_str().unwrap(),
        )]));
        assert!(result.is_err());
    }

    #[test]
    fn test_payload_cap_cannot_be_raised_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raise.json");
        std::fs::write(&path, r#"{ "max_payload_size": 65536 }"#).unwrap();

        let result = HarnessConfig::resolve(lookup_from(&[(
            CONFIG_PATH_ENV,
            path.to_str().unwrap(),
        )]));
        assert!(matches!(result, Err(HarnessError::Config(_))));
    }
}
