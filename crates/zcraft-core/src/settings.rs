//! Settings domain types and validation.
//!
//! This module contains the persisted configuration of the manager. These
//! are pure domain types; reading and writing the settings file lives in
//! the runtime crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{DEFAULT_ARTIFACT_NAME, DEFAULT_JAVA, LaunchSpec, MAX_RAM_GB};

/// Default server directory, relative to the current directory.
pub const DEFAULT_SERVER_DIR: &str = "minecraft_server";

/// Default minimum heap in gigabytes.
pub const DEFAULT_MIN_RAM_GB: u32 = 1;

/// Default maximum heap in gigabytes.
pub const DEFAULT_MAX_RAM_GB: u32 = 2;

/// Default time to wait for a graceful stop before forcing termination.
pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 30;

/// Default resource polling interval.
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 2;

/// Default pause between stop and start during a restart.
pub const DEFAULT_RESTART_SETTLE_SECS: u64 = 3;

/// Application settings structure.
///
/// All fields are optional to support partial updates and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory the server runs in.
    pub server_dir: Option<PathBuf>,

    /// Java runtime executable.
    pub java_path: Option<PathBuf>,

    /// Artifact file name or path, relative to `server_dir` unless absolute.
    pub artifact: Option<PathBuf>,

    /// Minimum heap in gigabytes.
    pub min_ram_gb: Option<u32>,

    /// Maximum heap in gigabytes.
    pub max_ram_gb: Option<u32>,

    /// Seconds to wait for a graceful stop before forcing termination.
    pub stop_timeout_secs: Option<u64>,

    /// Seconds between resource samples.
    pub monitor_interval_secs: Option<u64>,

    /// Seconds to pause between stop and start during a restart.
    pub restart_settle_secs: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            server_dir: Some(PathBuf::from(DEFAULT_SERVER_DIR)),
            java_path: Some(PathBuf::from(DEFAULT_JAVA)),
            artifact: Some(PathBuf::from(DEFAULT_ARTIFACT_NAME)),
            min_ram_gb: Some(DEFAULT_MIN_RAM_GB),
            max_ram_gb: Some(DEFAULT_MAX_RAM_GB),
            stop_timeout_secs: Some(DEFAULT_STOP_TIMEOUT_SECS),
            monitor_interval_secs: Some(DEFAULT_MONITOR_INTERVAL_SECS),
            restart_settle_secs: Some(DEFAULT_RESTART_SETTLE_SECS),
        }
    }

    /// Get the effective server directory.
    #[must_use]
    pub fn effective_server_dir(&self) -> PathBuf {
        self.server_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVER_DIR))
    }

    /// Get the effective minimum heap.
    #[must_use]
    pub fn effective_min_ram_gb(&self) -> u32 {
        self.min_ram_gb.unwrap_or(DEFAULT_MIN_RAM_GB)
    }

    /// Get the effective maximum heap.
    #[must_use]
    pub fn effective_max_ram_gb(&self) -> u32 {
        self.max_ram_gb.unwrap_or(DEFAULT_MAX_RAM_GB)
    }

    /// Get the effective stop timeout.
    #[must_use]
    pub fn effective_stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs.unwrap_or(DEFAULT_STOP_TIMEOUT_SECS))
    }

    /// Get the effective monitor interval.
    #[must_use]
    pub fn effective_monitor_interval(&self) -> Duration {
        Duration::from_secs(
            self.monitor_interval_secs
                .unwrap_or(DEFAULT_MONITOR_INTERVAL_SECS),
        )
    }

    /// Get the effective restart settle delay.
    #[must_use]
    pub fn effective_restart_settle(&self) -> Duration {
        Duration::from_secs(self.restart_settle_secs.unwrap_or(DEFAULT_RESTART_SETTLE_SECS))
    }

    /// Set the minimum heap, raising the maximum if it would fall below it.
    pub fn set_min_ram_gb(&mut self, gb: u32) {
        self.min_ram_gb = Some(gb);
        if self.effective_max_ram_gb() < gb {
            self.max_ram_gb = Some(gb);
        }
    }

    /// Set the maximum heap, lowering the minimum if it would exceed it.
    pub fn set_max_ram_gb(&mut self, gb: u32) {
        self.max_ram_gb = Some(gb);
        if self.effective_min_ram_gb() > gb {
            self.min_ram_gb = Some(gb);
        }
    }

    /// Build the launch spec these settings describe.
    #[must_use]
    pub fn launch_spec(&self) -> LaunchSpec {
        let artifact = self
            .artifact
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_NAME));
        let spec = LaunchSpec::new(
            artifact,
            self.effective_server_dir(),
            self.effective_min_ram_gb(),
            self.effective_max_ram_gb(),
        );
        match &self.java_path {
            Some(java) => spec.with_java(java.clone()),
            None => spec,
        }
    }

    /// Merge another settings into this one, only updating fields that are Some.
    pub fn merge(&mut self, other: &SettingsUpdate) {
        if let Some(ref dir) = other.server_dir {
            self.server_dir.clone_from(dir);
        }
        if let Some(ref java) = other.java_path {
            self.java_path.clone_from(java);
        }
        if let Some(ref artifact) = other.artifact {
            self.artifact.clone_from(artifact);
        }
        if let Some(min) = other.min_ram_gb {
            self.min_ram_gb = min;
        }
        if let Some(max) = other.max_ram_gb {
            self.max_ram_gb = max;
        }
        if let Some(timeout) = other.stop_timeout_secs {
            self.stop_timeout_secs = timeout;
        }
        if let Some(interval) = other.monitor_interval_secs {
            self.monitor_interval_secs = interval;
        }
        if let Some(settle) = other.restart_settle_secs {
            self.restart_settle_secs = settle;
        }
    }
}

/// Partial settings update.
///
/// Each field is `Option<Option<T>>`:
/// - `None` = don't change this field
/// - `Some(None)` = reset field to its default
/// - `Some(Some(value))` = set field to value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub server_dir: Option<Option<PathBuf>>,
    pub java_path: Option<Option<PathBuf>>,
    pub artifact: Option<Option<PathBuf>>,
    pub min_ram_gb: Option<Option<u32>>,
    pub max_ram_gb: Option<Option<u32>>,
    pub stop_timeout_secs: Option<Option<u64>>,
    pub monitor_interval_secs: Option<Option<u64>>,
    pub restart_settle_secs: Option<Option<u64>>,
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Memory must be between 1 and {max} GB, got {0}", max = MAX_RAM_GB)]
    InvalidRam(u32),

    #[error("Maximum memory ({max} GB) cannot be lower than minimum memory ({min} GB)")]
    InvertedRam { min: u32, max: u32 },

    #[error("Monitor interval must be between 1 and 60 seconds, got {0}")]
    InvalidMonitorInterval(u64),

    #[error("Server directory cannot be empty")]
    EmptyServerDir,

    #[error("Java path cannot be empty")]
    EmptyJavaPath,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    for ram in [settings.min_ram_gb, settings.max_ram_gb].into_iter().flatten() {
        if !(1..=MAX_RAM_GB).contains(&ram) {
            return Err(SettingsError::InvalidRam(ram));
        }
    }

    let (min, max) = (settings.effective_min_ram_gb(), settings.effective_max_ram_gb());
    if max < min {
        return Err(SettingsError::InvertedRam { min, max });
    }

    if let Some(interval) = settings.monitor_interval_secs {
        if !(1..=60).contains(&interval) {
            return Err(SettingsError::InvalidMonitorInterval(interval));
        }
    }

    if settings
        .server_dir
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(SettingsError::EmptyServerDir);
    }

    if settings
        .java_path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(SettingsError::EmptyJavaPath);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.min_ram_gb, Some(1));
        assert_eq!(settings.max_ram_gb, Some(2));
        assert_eq!(settings.effective_monitor_interval(), Duration::from_secs(2));
        assert_eq!(settings.effective_stop_timeout(), Duration::from_secs(30));
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_effective_values_without_fields() {
        let settings = Settings::default();
        assert_eq!(settings.effective_server_dir(), PathBuf::from(DEFAULT_SERVER_DIR));
        assert_eq!(settings.effective_min_ram_gb(), DEFAULT_MIN_RAM_GB);
        assert_eq!(settings.effective_max_ram_gb(), DEFAULT_MAX_RAM_GB);
    }

    #[test]
    fn test_min_ram_raises_max() {
        let mut settings = Settings::with_defaults();
        settings.set_min_ram_gb(6);
        assert_eq!(settings.min_ram_gb, Some(6));
        assert_eq!(settings.max_ram_gb, Some(6));
    }

    #[test]
    fn test_max_ram_lowers_min() {
        let mut settings = Settings::with_defaults();
        settings.set_min_ram_gb(4);
        settings.set_max_ram_gb(3);
        assert_eq!(settings.min_ram_gb, Some(3));
        assert_eq!(settings.max_ram_gb, Some(3));
    }

    #[test]
    fn test_validate_ram_out_of_range() {
        let settings = Settings {
            min_ram_gb: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvalidRam(0))
        ));
    }

    #[test]
    fn test_validate_inverted_ram() {
        let settings = Settings {
            min_ram_gb: Some(4),
            max_ram_gb: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::InvertedRam { min: 4, max: 2 })
        ));
    }

    #[test]
    fn test_validate_empty_java() {
        let settings = Settings {
            java_path: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(matches!(
            validate_settings(&settings),
            Err(SettingsError::EmptyJavaPath)
        ));
    }

    #[test]
    fn test_merge_settings() {
        let mut settings = Settings::with_defaults();
        let update = SettingsUpdate {
            max_ram_gb: Some(Some(8)),
            java_path: Some(None),
            ..Default::default()
        };
        settings.merge(&update);

        assert_eq!(settings.max_ram_gb, Some(8));
        assert_eq!(settings.java_path, None);
        assert_eq!(settings.min_ram_gb, Some(DEFAULT_MIN_RAM_GB));
    }

    #[test]
    fn test_launch_spec_from_settings() {
        let settings = Settings {
            server_dir: Some(PathBuf::from("/srv/mc")),
            java_path: Some(PathBuf::from("/opt/jdk/bin/java")),
            min_ram_gb: Some(2),
            max_ram_gb: Some(4),
            ..Default::default()
        };
        let spec = settings.launch_spec();
        assert_eq!(spec.working_dir, PathBuf::from("/srv/mc"));
        assert_eq!(spec.artifact_path, PathBuf::from(DEFAULT_ARTIFACT_NAME));
        assert_eq!(spec.java_path, PathBuf::from("/opt/jdk/bin/java"));
        assert_eq!(spec.ram_ceiling_mb(), 4096);
    }
}
