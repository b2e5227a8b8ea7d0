//! CLI-specific error types and mappings.
//!
//! Maps domain and runtime errors to exit codes and user-facing messages.

use thiserror::Error;
use zcraft_core::{EulaError, PropertiesError, SupervisorError};
use zcraft_runtime::SettingsFileError;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Operation refused by the supervisor or another domain rule.
    #[error("{0}")]
    Core(String),

    /// Argument or value error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Process execution error.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Process(_) => 71,  // EX_OSERR
        }
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        let message = match err.hint() {
            Some(hint) => format!("{err}. {hint}"),
            None => err.to_string(),
        };
        match err {
            SupervisorError::InvalidLaunchSpec(_) => Self::Arguments(message),
            SupervisorError::LaunchFailure(_) => Self::Process(message),
            SupervisorError::StreamIo(_) => Self::Io(message),
            SupervisorError::InvalidState { .. }
            | SupervisorError::ArtifactMissing(_)
            | SupervisorError::PreconditionUnmet(_) => Self::Core(message),
        }
    }
}

impl From<SettingsFileError> for CliError {
    fn from(err: SettingsFileError) -> Self {
        match err {
            SettingsFileError::Io { .. } => Self::Io(err.to_string()),
            SettingsFileError::NoConfigDir
            | SettingsFileError::Malformed { .. }
            | SettingsFileError::Invalid(_) => Self::Config(err.to_string()),
        }
    }
}

impl From<PropertiesError> for CliError {
    fn from(err: PropertiesError) -> Self {
        match err {
            PropertiesError::Io { .. } => Self::Io(err.to_string()),
            PropertiesError::InvalidKey(_)
            | PropertiesError::InvalidValue { .. }
            | PropertiesError::UnknownKey(_) => Self::Arguments(err.to_string()),
        }
    }
}

impl From<EulaError> for CliError {
    fn from(err: EulaError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
