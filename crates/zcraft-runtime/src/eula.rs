//! EULA acknowledgement backed by `eula.txt` in the server directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use zcraft_core::eula::{is_accepted, render};
use zcraft_core::{AcknowledgementPort, EULA_FILE_NAME, EulaError};

/// The server directory's `eula.txt`.
///
/// Read on every check so an acceptance made outside the manager is seen
/// without a restart.
#[derive(Debug, Clone)]
pub struct EulaFile {
    path: PathBuf,
}

impl EulaFile {
    /// The acknowledgement file inside `server_dir`.
    pub fn in_dir(server_dir: &Path) -> Self {
        Self {
            path: server_dir.join(EULA_FILE_NAME),
        }
    }

    /// Path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file exists and records acceptance.
    pub fn accepted(&self) -> Result<bool, EulaError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(is_accepted(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(EulaError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Write the file with the given answer, creating the directory if needed.
    pub fn write(&self, accepted: bool) -> Result<(), EulaError> {
        let io_err = |source| EulaError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, render(accepted)).map_err(io_err)?;
        info!(path = %self.path.display(), accepted, "EULA file written");
        Ok(())
    }

    /// Record acceptance.
    pub fn accept(&self) -> Result<(), EulaError> {
        self.write(true)
    }
}

impl AcknowledgementPort for EulaFile {
    fn is_acknowledged(&self) -> bool {
        self.accepted().unwrap_or_else(|e| {
            debug!(error = %e, "cannot read EULA file, treating as not accepted");
            false
        })
    }
}
