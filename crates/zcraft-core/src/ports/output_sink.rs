//! Output sink port for server console lines.
//!
//! This port abstracts the destination for console lines so the stream
//! consumer does not know whether it is feeding a terminal, a ring buffer
//! or an event channel.

use crate::events::OutputLine;

/// Port for appending console lines to a sink.
///
/// Implementations must be thread-safe and must not block; lines arrive in
/// stream order and must be kept in that order.
pub trait OutputSinkPort: Send + Sync {
    /// Append one console line.
    fn append(&self, line: &OutputLine);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOutputSink;

impl OutputSinkPort for NoopOutputSink {
    fn append(&self, _line: &OutputLine) {}
}
