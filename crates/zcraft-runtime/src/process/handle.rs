//! Handle to one running server process.
//!
//! The tokio `Child` is owned by a reaper task. Everything else talks to
//! the process through a [`ProcessHandle`]: commands go through
//! [`CommandInput`], liveness is read from [`Liveness`], and kill requests
//! are sent to the reaper over a channel.

use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, warn};

/// Identity of one process run.
///
/// Assigned on every successful start. Workers carry the id of the run they
/// were spawned for so that late completions from a torn-down run can be
/// told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    /// Wrap a raw run counter value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How the process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, absent when the process was killed by a signal or the
    /// exit status could not be read.
    pub code: Option<i32>,
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Shared "is the process still running" predicate.
///
/// Backed by the reaper's exit notification, so every holder agrees on
/// liveness without polling the OS.
#[derive(Debug, Clone)]
pub struct Liveness {
    exit_rx: watch::Receiver<Option<ProcessExit>>,
}

impl Liveness {
    /// `true` until the reaper has observed the process exit.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.exit_rx.borrow().is_none()
    }

    /// Exit information, once the process has exited.
    #[must_use]
    pub fn exit(&self) -> Option<ProcessExit> {
        *self.exit_rx.borrow()
    }

    /// Wait until the process has exited.
    ///
    /// Returns `None` only if the reaper went away without reporting, which
    /// means the exit status is unknown.
    pub async fn wait_exit(&self) -> Option<ProcessExit> {
        let mut rx = self.exit_rx.clone();
        rx.wait_for(Option::is_some).await.ok().and_then(|exit| *exit)
    }
}

/// Serialized writer for the process's standard input.
///
/// The stop command and operator commands share this writer; the mutex
/// keeps lines from interleaving.
#[derive(Debug, Clone)]
pub struct CommandInput {
    stdin: Arc<Mutex<Option<ChildStdin>>>,
}

impl CommandInput {
    fn new(stdin: Option<ChildStdin>) -> Self {
        Self {
            stdin: Arc::new(Mutex::new(stdin)),
        }
    }

    /// Write `line` followed by a newline and flush.
    pub async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "server input is closed"))?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        stdin.write_all(buf.as_bytes()).await?;
        stdin.flush().await
    }

    /// Close the input stream. Later writes fail with `BrokenPipe`.
    pub async fn close(&self) {
        let mut guard = self.stdin.lock().await;
        if let Some(mut stdin) = guard.take() {
            if let Err(e) = stdin.shutdown().await {
                debug!(error = %e, "server input already closed");
            }
        }
    }
}

/// Handle to a spawned server process.
///
/// Cheap to clone. Dropping every clone asks the reaper to kill the process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: u32,
    started: Instant,
    started_at: DateTime<Utc>,
    input: CommandInput,
    liveness: Liveness,
    kill_tx: mpsc::Sender<()>,
}

impl ProcessHandle {
    /// Take ownership of `child`, spawning its reaper task.
    ///
    /// The caller must already have taken stdout and stderr if it wants
    /// them; stdin is taken here.
    pub fn adopt(mut child: Child, pid: u32) -> Self {
        let stdin = child.stdin.take();
        let (exit_tx, exit_rx) = watch::channel(None);
        let (kill_tx, kill_rx) = mpsc::channel(4);

        tokio::spawn(reap(child, pid, exit_tx, kill_rx));

        Self {
            pid,
            started: Instant::now(),
            started_at: Utc::now(),
            input: CommandInput::new(stdin),
            liveness: Liveness { exit_rx },
            kill_tx,
        }
    }

    /// OS process id.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Monotonic instant the process was confirmed spawned.
    #[must_use]
    pub const fn started(&self) -> Instant {
        self.started
    }

    /// Wall-clock time the process was confirmed spawned.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Command writer.
    #[must_use]
    pub const fn input(&self) -> &CommandInput {
        &self.input
    }

    /// Liveness predicate shared with background workers.
    #[must_use]
    pub const fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// `true` while the process is running.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Ask the reaper to kill the process immediately.
    pub fn force_kill(&self) {
        if self.kill_tx.try_send(()).is_err() {
            debug!(pid = %self.pid, "kill request not delivered; process already reaped");
        }
    }
}

async fn reap(
    mut child: Child,
    pid: u32,
    exit_tx: watch::Sender<Option<ProcessExit>>,
    mut kill_rx: mpsc::Receiver<()>,
) {
    let mut handles_open = true;

    let exit = loop {
        tokio::select! {
            status = child.wait() => {
                break match status {
                    Ok(status) => ProcessExit::from(status),
                    Err(e) => {
                        warn!(pid = %pid, error = %e, "failed to read server exit status");
                        ProcessExit { code: None }
                    }
                };
            }
            request = kill_rx.recv(), if handles_open => {
                if request.is_none() {
                    // Every handle is gone; nobody can stop the server any more.
                    handles_open = false;
                    debug!(pid = %pid, "all process handles dropped, killing server");
                }
                if let Err(e) = child.start_kill() {
                    debug!(pid = %pid, error = %e, "kill failed; process may have exited");
                }
            }
        }
    };

    debug!(pid = %pid, code = ?exit.code, "server process reaped");
    exit_tx.send_replace(Some(exit));
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use std::time::Duration;
    use tokio::process::Command;
    use tokio::time::timeout;

    fn spawn(program: &str, args: &[&str]) -> ProcessHandle {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .expect("failed to spawn test process");
        let pid = child.id().expect("child has a pid");
        ProcessHandle::adopt(child, pid)
    }

    #[tokio::test]
    async fn test_liveness_reports_exit_code() {
        let handle = spawn("sh", &["-c", "exit 3"]);
        let exit = timeout(Duration::from_secs(5), handle.liveness().wait_exit())
            .await
            .expect("process should exit");

        assert_eq!(exit, Some(ProcessExit { code: Some(3) }));
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_force_kill() {
        let handle = spawn("sleep", &["30"]);
        assert!(handle.is_alive());

        handle.force_kill();
        let exit = timeout(Duration::from_secs(5), handle.liveness().wait_exit())
            .await
            .expect("killed process should be reaped");

        assert_eq!(exit.and_then(|e| e.code), None);
    }

    #[tokio::test]
    async fn test_command_input_reaches_process() {
        let handle = spawn("sh", &["-c", "read line; [ \"$line\" = stop ] && exit 7"]);
        handle.input().write_line("stop").await.unwrap();

        let exit = timeout(Duration::from_secs(5), handle.liveness().wait_exit())
            .await
            .unwrap();
        assert_eq!(exit, Some(ProcessExit { code: Some(7) }));
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let handle = spawn("cat", &[]);
        handle.input().close().await;

        let err = handle.input().write_line("hello").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        // cat exits once its input is closed
        timeout(Duration::from_secs(5), handle.liveness().wait_exit())
            .await
            .unwrap();
    }

    #[test]
    fn test_run_id_display() {
        assert_eq!(RunId::new(4).to_string(), "#4");
        assert!(RunId::new(1) < RunId::new(2));
    }
}
