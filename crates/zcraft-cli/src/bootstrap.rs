//! CLI bootstrap - the composition root.
//!
//! Resolves the settings file, loads it and applies the per-invocation
//! overrides. Handlers receive the resulting [`CliContext`].

use std::path::{Path, PathBuf};

use tracing::debug;
use zcraft_core::{LaunchSpec, Settings};
use zcraft_runtime::{default_settings_path, load_settings, save_settings};

use crate::error::CliError;

/// Settings as loaded for one invocation.
#[derive(Debug, Clone)]
pub struct CliContext {
    settings_path: PathBuf,
    /// Exactly what is on disk.
    persisted: Settings,
    /// `persisted` with command-line overrides applied.
    effective: Settings,
}

impl CliContext {
    /// Build a context from already loaded settings.
    pub fn new(settings_path: PathBuf, persisted: Settings, server_dir: Option<PathBuf>) -> Self {
        let mut effective = persisted.clone();
        if let Some(dir) = server_dir {
            effective.server_dir = Some(dir);
        }
        Self {
            settings_path,
            persisted,
            effective,
        }
    }

    /// Location of the settings file.
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Settings in effect for this invocation.
    pub const fn settings(&self) -> &Settings {
        &self.effective
    }

    /// The server directory in effect.
    pub fn server_dir(&self) -> PathBuf {
        self.effective.effective_server_dir()
    }

    /// Launch spec built from the effective settings.
    pub fn launch_spec(&self) -> LaunchSpec {
        self.effective.launch_spec()
    }

    /// Apply `edit` to the persisted settings and write them back.
    ///
    /// Overrides given on the command line are not persisted.
    pub fn update_settings(
        &mut self,
        edit: impl Fn(&mut Settings),
    ) -> Result<&Settings, CliError> {
        let mut updated = self.persisted.clone();
        edit(&mut updated);
        save_settings(&self.settings_path, &updated)?;

        edit(&mut self.effective);
        self.persisted = updated;
        Ok(&self.persisted)
    }
}

/// Load settings from `config` (or the default location) and apply overrides.
pub fn bootstrap(
    config: Option<PathBuf>,
    server_dir: Option<PathBuf>,
) -> Result<CliContext, CliError> {
    let settings_path = match config {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let persisted = load_settings(&settings_path)?;
    debug!(path = %settings_path.display(), "settings loaded");
    Ok(CliContext::new(settings_path, persisted, server_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_server_dir_override_is_not_persisted() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("settings.json");

        let mut ctx = bootstrap(Some(path.clone()), Some(temp.path().join("other"))).unwrap();
        assert_eq!(ctx.server_dir(), temp.path().join("other"));

        ctx.update_settings(|s| s.set_max_ram_gb(4)).unwrap();
        assert_eq!(ctx.settings().max_ram_gb, Some(4));

        let reloaded = bootstrap(Some(path), None).unwrap();
        assert_eq!(reloaded.settings().max_ram_gb, Some(4));
        assert_ne!(reloaded.server_dir(), temp.path().join("other"));
    }
}
