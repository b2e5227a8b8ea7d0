//! Launch parameters for one server run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ports::SupervisorError;

/// Default artifact file name inside the server directory.
pub const DEFAULT_ARTIFACT_NAME: &str = "server.jar";

/// Default Java runtime used to launch the artifact.
pub const DEFAULT_JAVA: &str = "java";

/// Upper bound for either memory ceiling, in gigabytes.
pub const MAX_RAM_GB: u32 = 64;

/// Immutable snapshot of everything needed to launch the server.
///
/// Built by the caller (usually from [`Settings`](crate::Settings)) and
/// re-validated by the supervisor before anything is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSpec {
    /// Path to the launchable artifact (a server jar).
    pub artifact_path: PathBuf,
    /// Working directory of the child process.
    pub working_dir: PathBuf,
    /// Minimum heap size in whole gigabytes.
    pub min_ram_gb: u32,
    /// Maximum heap size in whole gigabytes.
    pub max_ram_gb: u32,
    /// Java runtime executable.
    pub java_path: PathBuf,
}

impl LaunchSpec {
    /// Create a launch spec with the default Java runtime.
    pub fn new(
        artifact_path: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        min_ram_gb: u32,
        max_ram_gb: u32,
    ) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            working_dir: working_dir.into(),
            min_ram_gb,
            max_ram_gb,
            java_path: PathBuf::from(DEFAULT_JAVA),
        }
    }

    /// Use a specific Java runtime instead of the one on `PATH`.
    #[must_use]
    pub fn with_java(mut self, java_path: impl Into<PathBuf>) -> Self {
        self.java_path = java_path.into();
        self
    }

    /// Check the memory ceilings.
    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.min_ram_gb < 1 {
            return Err(SupervisorError::InvalidLaunchSpec(
                "minimum memory must be at least 1 GB".to_string(),
            ));
        }
        if self.max_ram_gb < self.min_ram_gb {
            return Err(SupervisorError::InvalidLaunchSpec(format!(
                "maximum memory ({} GB) is below minimum memory ({} GB)",
                self.max_ram_gb, self.min_ram_gb
            )));
        }
        if self.max_ram_gb > MAX_RAM_GB {
            return Err(SupervisorError::InvalidLaunchSpec(format!(
                "maximum memory cannot exceed {MAX_RAM_GB} GB"
            )));
        }
        Ok(())
    }

    /// Locate the artifact, falling back to `server.jar` in the working directory.
    ///
    /// The returned path is absolute. The child runs inside `working_dir`,
    /// so a path relative to the manager's directory would not resolve there.
    pub fn resolve_artifact(&self) -> Result<PathBuf, SupervisorError> {
        let configured = self.absolute(&self.artifact_path);
        if configured.is_file() {
            return Ok(configured);
        }

        let fallback = self.absolute(Path::new(DEFAULT_ARTIFACT_NAME));
        if fallback.is_file() {
            return Ok(fallback);
        }

        Err(SupervisorError::ArtifactMissing(configured))
    }

    /// Arguments passed to the Java runtime for the given artifact.
    pub fn jvm_args(&self, artifact: &Path) -> Vec<String> {
        vec![
            format!("-Xmx{}G", self.max_ram_gb),
            format!("-Xms{}G", self.min_ram_gb),
            "-jar".to_string(),
            artifact.display().to_string(),
            "nogui".to_string(),
        ]
    }

    /// Memory ceiling in megabytes, used for the memory percentage figure.
    #[must_use]
    pub const fn ram_ceiling_mb(&self) -> u64 {
        self.max_ram_gb as u64 * 1024
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        };
        std::path::absolute(&joined).unwrap_or(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(min: u32, max: u32) -> LaunchSpec {
        LaunchSpec::new("server.jar", "/srv/minecraft", min, max)
    }

    #[test]
    fn test_validate_accepts_equal_ceilings() {
        assert!(spec(2, 2).validate().is_ok());
        assert!(spec(1, 4).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_minimum() {
        let err = spec(0, 2).validate().unwrap_err();
        assert!(matches!(err, SupervisorError::InvalidLaunchSpec(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_ceilings() {
        let err = spec(4, 2).validate().unwrap_err();
        assert!(err.to_string().contains("below minimum"));
    }

    #[test]
    fn test_validate_rejects_oversized_ceiling() {
        assert!(spec(1, MAX_RAM_GB + 1).validate().is_err());
    }

    #[test]
    fn test_jvm_args_match_launch_contract() {
        let args = spec(1, 2).jvm_args(Path::new("server.jar"));
        assert_eq!(args, ["-Xmx2G", "-Xms1G", "-jar", "server.jar", "nogui"]);
    }

    #[test]
    fn test_ram_ceiling() {
        assert_eq!(spec(1, 3).ram_ceiling_mb(), 3072);
    }

    #[test]
    fn test_resolve_artifact_missing() {
        let spec = LaunchSpec::new("nope.jar", "/definitely/not/a/dir", 1, 2);
        match spec.resolve_artifact() {
            Err(SupervisorError::ArtifactMissing(path)) => {
                assert_eq!(path, PathBuf::from("/definitely/not/a/dir/nope.jar"));
            }
            other => panic!("expected ArtifactMissing, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_artifact_with_relative_working_dir_is_absolute() {
        // Tests run from the package root, where Cargo.toml exists.
        let spec = LaunchSpec::new("Cargo.toml", ".", 1, 2);
        let resolved = spec.resolve_artifact().unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.is_file());
        assert!(resolved.ends_with("Cargo.toml"));
    }
}
