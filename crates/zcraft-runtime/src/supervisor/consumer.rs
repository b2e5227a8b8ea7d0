//! Output Stream Consumer.
//!
//! Drains the combined stdout/stderr line channel for one run, forwarding
//! each line to the output sink in arrival order and feeding it to the
//! telemetry parser. It never touches lifecycle state; the caller decides
//! what end-of-stream means.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

use zcraft_core::{OutputLine, OutputSinkPort};

use crate::process::{Liveness, RunId};
use crate::telemetry::{TelemetryStore, parse_line};

/// How long to keep draining after the process has exited, in case a
/// grandchild still holds the output pipes open.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Why the consumer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerEnd {
    /// Both streams reached end-of-stream.
    EndOfStream,
    /// The process exited and the streams went quiet.
    ProcessExited,
}

/// Consume lines until end-of-stream or the bound process is gone.
pub async fn consume_output(
    run_id: RunId,
    mut lines: mpsc::Receiver<String>,
    liveness: Liveness,
    sink: Arc<dyn OutputSinkPort>,
    telemetry: Arc<TelemetryStore>,
) -> ConsumerEnd {
    let mut exited = false;
    let mut forwarded: u64 = 0;

    let end = loop {
        let next = if exited {
            match timeout(DRAIN_GRACE, lines.recv()).await {
                Ok(next) => next,
                Err(_) => break ConsumerEnd::ProcessExited,
            }
        } else {
            tokio::select! {
                next = lines.recv() => next,
                _ = liveness.wait_exit() => {
                    exited = true;
                    continue;
                }
            }
        };

        let Some(text) = next else {
            break ConsumerEnd::EndOfStream;
        };

        let signals = parse_line(&text);
        sink.append(&OutputLine::server(text));
        if !signals.is_empty() {
            telemetry.apply(run_id, &signals);
        }
        forwarded += 1;
    };

    debug!(run = %run_id, lines = forwarded, ?end, "output consumer finished");
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ConsoleLog;
    use chrono::Utc;

    #[cfg(unix)]
    fn sleeping_process() -> crate::process::ProcessHandle {
        let child = tokio::process::Command::new("sleep")
            .arg("30")
            .stdin(std::process::Stdio::piped())
            .spawn()
            .expect("failed to spawn sleep");
        let pid = child.id().expect("child has a pid");
        crate::process::ProcessHandle::adopt(child, pid)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_lines_forwarded_in_order_and_parsed() {
        let handle = sleeping_process();
        let run = RunId::new(1);
        let console = Arc::new(ConsoleLog::new());
        let telemetry = Arc::new(TelemetryStore::new());
        telemetry.reset(run, 2048, Utc::now());

        let (tx, rx) = mpsc::channel(16);
        for line in [
            "Starting minecraft server version 1.21",
            "Player123 joined the game",
            "[INFO]: TPS: 19.8",
        ] {
            tx.send(line.to_string()).await.unwrap();
        }
        drop(tx);

        let end = consume_output(
            run,
            rx,
            handle.liveness().clone(),
            console.clone(),
            telemetry.clone(),
        )
        .await;

        assert_eq!(end, ConsumerEnd::EndOfStream);
        let texts: Vec<_> = console.lines().into_iter().map(|l| l.text).collect();
        assert_eq!(texts[1], "Player123 joined the game");
        assert_eq!(texts.len(), 3);

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.players_online, 1);
        assert!((snapshot.tick_rate - 19.8).abs() < f64::EPSILON);

        handle.force_kill();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_consumer_ends_when_process_exits_with_pipe_held_open() {
        let handle = sleeping_process();
        let console: Arc<dyn OutputSinkPort> = Arc::new(ConsoleLog::new());
        let telemetry = Arc::new(TelemetryStore::new());

        // The sender stays alive, as if a grandchild kept the pipe open.
        let (_tx, rx) = mpsc::channel::<String>(16);
        handle.force_kill();

        let end = timeout(
            Duration::from_secs(10),
            consume_output(RunId::new(1), rx, handle.liveness().clone(), console, telemetry),
        )
        .await
        .expect("consumer should give up after the drain grace");

        assert_eq!(end, ConsumerEnd::ProcessExited);
    }
}
