//! Server lifecycle states and the transition table.
//!
//! ```text
//! Offline --start--> Starting --spawned--> Online --stop--> Stopping --exited--> Offline
//!                    Starting --launch failed--> Offline
//!                                          Online --unsolicited exit--> Offline
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authoritative phase of the supervised server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// No process exists. Initial state and terminal state of every run.
    #[default]
    Offline,
    /// Launch has been requested and the process is being spawned.
    Starting,
    /// The process exists and its streams are attached.
    ///
    /// This does not mean the game world has finished loading.
    Online,
    /// A graceful shutdown has been requested and exit is being awaited.
    Stopping,
}

impl LifecycleState {
    /// Whether `self -> next` is an edge of the lifecycle state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Offline, Self::Starting)
                | (Self::Starting, Self::Online)
                | (Self::Starting, Self::Offline)
                | (Self::Online, Self::Stopping)
                | (Self::Online, Self::Offline)
                | (Self::Stopping, Self::Offline)
        )
    }

    /// Whether a process may exist in this state.
    #[must_use]
    pub const fn has_process(self) -> bool {
        !matches!(self, Self::Offline)
    }

    /// Lowercase label used in logs and status output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Starting => "starting",
            Self::Online => "online",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
