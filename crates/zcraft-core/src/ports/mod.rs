//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.

pub mod acknowledgement;
pub mod output_sink;

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::LifecycleState;

pub use acknowledgement::{AcknowledgementPort, StaticAcknowledgement};
pub use output_sink::{NoopOutputSink, OutputSinkPort};

/// Errors returned by supervisor operations.
///
/// Precondition failures (`InvalidState`, `ArtifactMissing`,
/// `PreconditionUnmet`, `InvalidLaunchSpec`) are detected before any state
/// change happens. Adapters should present them as actionable messages.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The operation is not permitted from the current lifecycle state.
    #[error("Cannot {operation} while the server is {state}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,
        /// State observed when the operation was rejected.
        state: LifecycleState,
    },

    /// No launchable artifact at the expected location.
    #[error("Server artifact not found: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// A required acknowledgement (the EULA) has not been given.
    #[error("Precondition not met: {0}")]
    PreconditionUnmet(String),

    /// Memory ceilings are out of range.
    #[error("Invalid launch parameters: {0}")]
    InvalidLaunchSpec(String),

    /// The OS rejected process creation.
    #[error("Failed to launch server: {0}")]
    LaunchFailure(#[source] std::io::Error),

    /// Writing to the server's input stream failed.
    #[error("Failed to write to server input: {0}")]
    StreamIo(#[source] std::io::Error),
}

impl SupervisorError {
    /// Shorthand for [`SupervisorError::InvalidState`].
    #[must_use]
    pub const fn invalid_state(operation: &'static str, state: LifecycleState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Whether the caller can fix the problem and retry.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. }
                | Self::ArtifactMissing(_)
                | Self::PreconditionUnmet(_)
                | Self::InvalidLaunchSpec(_)
        )
    }

    /// Short suggestion for resolving an actionable error.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ArtifactMissing(_) => Some("Download a server jar into the server directory first."),
            Self::PreconditionUnmet(_) => Some("Read and accept the Minecraft EULA first."),
            Self::InvalidLaunchSpec(_) => Some("Adjust the minimum and maximum memory settings."),
            Self::InvalidState { state, .. } => match state {
                LifecycleState::Offline => Some("The server is not running."),
                LifecycleState::Online => Some("The server is already running."),
                LifecycleState::Starting | LifecycleState::Stopping => {
                    Some("Wait for the current operation to finish.")
                }
            },
            Self::LaunchFailure(_) | Self::StreamIo(_) => None,
        }
    }
}
