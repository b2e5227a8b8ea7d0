//! Async stream line pumps (non-UTF8-safe).
//!
//! The server and its plugins can emit non-UTF8 bytes on stdout/stderr.
//! Using `BufReader::lines()` would terminate the reader on invalid UTF-8,
//! so lines are read as bytes and decoded lossily.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::handle::RunId;

/// Capacity of the channel joining both pumps to the consumer.
pub const LINE_CHANNEL_CAPACITY: usize = 1024;

/// Read `stream` line by line, sending each decoded line to `tx`.
///
/// Stops at end-of-stream, on a read error, or when the receiver is gone.
/// Stdout and stderr each get their own pump feeding the same channel;
/// the channel closes once both pumps have finished.
pub fn spawn_stream_pump(
    stream: impl AsyncRead + Unpin + Send + 'static,
    run_id: RunId,
    stream_type: &'static str,
    tx: mpsc::Sender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).await.is_err() {
                        debug!(run = %run_id, %stream_type, "line consumer gone, pump exiting");
                        break;
                    }
                }
                Err(e) => {
                    debug!(run = %run_id, %stream_type, error = %e, "stream pump exiting due to read error");
                    break;
                }
            }
        }

        debug!(run = %run_id, %stream_type, "stream pump task exiting");
    })
}
