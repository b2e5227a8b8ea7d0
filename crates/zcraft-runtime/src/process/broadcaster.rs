//! Server event broadcasting for control surfaces.

use tokio::sync::broadcast;
use tracing::trace;

use zcraft_core::{OutputLine, OutputSinkPort, ServerEvent};

/// Broadcast channel capacity for server events.
///
/// Sized for console bursts during world generation; a subscriber that
/// falls further behind sees `RecvError::Lagged` and skips ahead.
const CHANNEL_CAPACITY: usize = 1024;

/// Broadcaster for lifecycle, output and telemetry events.
#[derive(Debug)]
pub struct ServerEventBroadcaster {
    sender: broadcast::Sender<ServerEvent>,
}

impl ServerEventBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast a server event to all subscribers
    pub fn broadcast(&self, event: ServerEvent) {
        // Only send if there are receivers (no surface attached is normal)
        if self.sender.receiver_count() > 0 {
            trace!(?event, "Broadcasting server event");
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to server events
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ServerEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSinkPort for ServerEventBroadcaster {
    fn append(&self, line: &OutputLine) {
        self.broadcast(ServerEvent::Output(line.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_output_lines_become_events() {
        let broadcaster = ServerEventBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.append(&OutputLine::server("hello"));

        match rx.recv().await.unwrap() {
            ServerEvent::Output(line) => assert_eq!(line.text, "hello"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_without_subscribers_is_silent() {
        let broadcaster = ServerEventBroadcaster::default();
        broadcaster.append(&OutputLine::manager("nobody listening"));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
