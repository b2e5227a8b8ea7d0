//! Server lifecycle, console and telemetry events.
//!
//! These events are emitted by the supervisor and consumed by a control
//! surface to keep its view of the server in sync. The supervisor is the
//! only producer of `ServerEvent::State`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{LifecycleState, TelemetrySnapshot};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopReason {
    /// An operator asked for the stop.
    Requested,
    /// The process exited on its own while online.
    Crashed,
    /// The OS refused to create the process.
    LaunchFailed,
}

/// A lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    /// State before the transition.
    pub previous: LifecycleState,
    /// State after the transition.
    pub state: LifecycleState,
    /// Set only on transitions into `Offline`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StopReason>,
    /// Exit code of the process, when it exited normally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Unix timestamp in milliseconds when the transition happened.
    pub updated_at: u64,
}

impl StateChange {
    /// Create a transition record stamped with the current time.
    pub fn new(previous: LifecycleState, state: LifecycleState) -> Self {
        Self {
            previous,
            state,
            reason: None,
            exit_code: None,
            updated_at: now_ms(),
        }
    }

    /// Attach the reason a run ended.
    #[must_use]
    pub const fn with_reason(mut self, reason: StopReason) -> Self {
        self.reason = Some(reason);
        self
    }

    /// Attach the exit code of the process.
    #[must_use]
    pub const fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// `true` when the process ended without being asked to.
    #[must_use]
    pub fn crashed(&self) -> bool {
        self.reason == Some(StopReason::Crashed)
    }
}

/// Origin of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSource {
    /// Read from the server's stdout or stderr.
    Server,
    /// Echo of a command written by an operator.
    Operator,
    /// Notice generated by the supervisor itself.
    Manager,
}

/// One console line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputLine {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Where the line came from.
    pub source: OutputSource,
    /// Line content without the trailing newline.
    pub text: String,
}

impl OutputLine {
    /// Create a line stamped with the current time.
    pub fn new(source: OutputSource, text: impl Into<String>) -> Self {
        Self {
            timestamp: now_ms(),
            source,
            text: text.into(),
        }
    }

    /// A line read from the server process.
    pub fn server(text: impl Into<String>) -> Self {
        Self::new(OutputSource::Server, text)
    }

    /// A supervisor notice.
    pub fn manager(text: impl Into<String>) -> Self {
        Self::new(OutputSource::Manager, text)
    }

    /// Echo of an operator command, rendered as `> command`.
    pub fn operator(command: &str) -> Self {
        Self::new(OutputSource::Operator, format!("> {command}"))
    }
}

/// Event payload delivered to control surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// The lifecycle state changed.
    State(StateChange),
    /// A console line, in stream order.
    Output(OutputLine),
    /// Periodic telemetry refresh.
    Telemetry(TelemetrySnapshot),
}

impl ServerEvent {
    /// The state change carried by this event, if any.
    #[must_use]
    pub const fn as_state(&self) -> Option<&StateChange> {
        match self {
            Self::State(change) => Some(change),
            _ => None,
        }
    }
}

#[allow(clippy::cast_sign_loss)]
fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_event_serialization() {
        let event = ServerEvent::State(
            StateChange::new(LifecycleState::Online, LifecycleState::Offline)
                .with_reason(StopReason::Crashed)
                .with_exit_code(Some(1)),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"state\""));
        assert!(json.contains("\"state\":\"offline\""));
        assert!(json.contains("\"reason\":\"crashed\""));
        assert!(json.contains("\"exitCode\":1"));
    }

    #[test]
    fn test_crash_flag_distinguishes_requested_stop() {
        let crashed = StateChange::new(LifecycleState::Online, LifecycleState::Offline)
            .with_reason(StopReason::Crashed);
        let stopped = StateChange::new(LifecycleState::Stopping, LifecycleState::Offline)
            .with_reason(StopReason::Requested);
        assert!(crashed.crashed());
        assert!(!stopped.crashed());
    }

    #[test]
    fn test_operator_echo() {
        let line = OutputLine::operator("say hi");
        assert_eq!(line.text, "> say hi");
        assert_eq!(line.source, OutputSource::Operator);
    }
}
