//! Settings persistence.
//!
//! Settings are stored as pretty JSON at `<config_dir>/zcraft/settings.json`.
//! A missing file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use zcraft_core::{Settings, SettingsError, validate_settings};

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV_VAR: &str = "ZCRAFT_CONFIG";

const APP_DIR: &str = "zcraft";
const SETTINGS_FILE: &str = "settings.json";

/// Errors from locating, reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsFileError {
    /// Could not determine the platform configuration directory.
    #[error("Cannot determine configuration directory")]
    NoConfigDir,

    /// Failed to read or write the file.
    #[error("Failed to access settings file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The file exists but is not valid settings JSON.
    #[error("Settings file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The values failed validation.
    #[error(transparent)]
    Invalid(#[from] SettingsError),
}

/// Default location of the settings file.
pub fn default_settings_path() -> Result<PathBuf, SettingsFileError> {
    let base = dirs::config_dir().ok_or(SettingsFileError::NoConfigDir)?;
    Ok(base.join(APP_DIR).join(SETTINGS_FILE))
}

/// Load settings from `path`.
///
/// Missing fields are filled from defaults; a missing file yields defaults.
pub fn load_settings(path: &Path) -> Result<Settings, SettingsFileError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Settings::with_defaults());
        }
        Err(e) => {
            return Err(SettingsFileError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let stored: Settings =
        serde_json::from_str(&content).map_err(|e| SettingsFileError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let settings = fill_defaults(stored);
    validate_settings(&settings)?;
    Ok(settings)
}

/// Validate and write settings to `path`, creating parent directories.
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), SettingsFileError> {
    validate_settings(settings)?;

    let io_err = |e: std::io::Error| SettingsFileError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(|e| SettingsFileError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, json + "\n").map_err(io_err)?;

    debug!(path = %path.display(), "settings saved");
    Ok(())
}

fn fill_defaults(stored: Settings) -> Settings {
    let defaults = Settings::with_defaults();
    Settings {
        server_dir: stored.server_dir.or(defaults.server_dir),
        java_path: stored.java_path.or(defaults.java_path),
        artifact: stored.artifact.or(defaults.artifact),
        min_ram_gb: stored.min_ram_gb.or(defaults.min_ram_gb),
        max_ram_gb: stored.max_ram_gb.or(defaults.max_ram_gb),
        stop_timeout_secs: stored.stop_timeout_secs.or(defaults.stop_timeout_secs),
        monitor_interval_secs: stored
            .monitor_interval_secs
            .or(defaults.monitor_interval_secs),
        restart_settle_secs: stored.restart_settle_secs.or(defaults.restart_settle_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings(&temp.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::with_defaults());
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("settings.json");

        let mut settings = Settings::with_defaults();
        settings.set_max_ram_gb(6);
        settings.java_path = Some(PathBuf::from("/opt/jdk21/bin/java"));
        save_settings(&path, &settings).unwrap();

        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_is_filled() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");
        fs::write(&path, r#"{ "max_ram_gb": 4 }"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.max_ram_gb, Some(4));
        assert_eq!(settings.min_ram_gb, Some(1));
        assert_eq!(settings.effective_server_dir(), PathBuf::from("minecraft_server"));
    }

    #[test]
    fn test_malformed_and_invalid_files() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(SettingsFileError::Malformed { .. })
        ));

        fs::write(&path, r#"{ "min_ram_gb": 8, "max_ram_gb": 2 }"#).unwrap();
        assert!(matches!(
            load_settings(&path),
            Err(SettingsFileError::Invalid(SettingsError::InvertedRam { .. }))
        ));
    }

    #[test]
    fn test_save_rejects_invalid() {
        let temp = tempdir().unwrap();
        let settings = Settings {
            max_ram_gb: Some(500),
            ..Settings::with_defaults()
        };
        assert!(save_settings(&temp.path().join("s.json"), &settings).is_err());
        assert!(!temp.path().join("s.json").exists());
    }
}
