//! Lifecycle Supervisor for the game server process.
//!
//! The supervisor is the only writer of [`LifecycleState`]. Every transition
//! goes through one transition function, which checks the state machine and
//! publishes the change on both the state watch channel and the event
//! broadcaster while the slot lock is held, so observers see transitions
//! in the order they happened.
//!
//! Per run it spawns:
//! - two stream pumps (stdout, stderr) feeding one line channel
//! - the output consumer, which reports end-of-stream back here
//! - the resource monitor
//! - on `stop`, a waiter that confirms exit (escalating if needed)
//!
//! Workers are bound to a [`RunId`]; completions for a run that is no
//! longer current are ignored.

mod consumer;

pub use consumer::{ConsumerEnd, consume_output};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use zcraft_core::{
    AcknowledgementPort, LaunchSpec, LifecycleState, NoopOutputSink, OutputLine, OutputSinkPort,
    ServerEvent, Settings, StateChange, StopReason, SupervisorError, TelemetrySnapshot,
};

use crate::process::{
    ConsoleLog, LINE_CHANNEL_CAPACITY, ProcessExit, ProcessHandle, RunId, ServerEventBroadcaster,
    TERMINATE_GRACE, build_launch_command, spawn_stream_pump, terminate, wait_or_terminate,
};
use crate::telemetry::{ResourceMonitor, TelemetryStore};

/// Command line the server understands as "save and exit".
pub const STOP_COMMAND: &str = "stop";

/// How long to wait for the process to exit after its output closed
/// while online, before killing it.
const EXIT_CONFIRM_GRACE: Duration = Duration::from_secs(5);

/// How long a stop waits for buffered output after the process exited.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(3);

/// Timing knobs for the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Resource monitor polling interval.
    pub monitor_interval: Duration,
    /// Default time a stop waits for the server before forcing termination.
    pub stop_timeout: Duration,
    /// Pause between confirmed stop and start during a restart.
    pub restart_settle: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self::from_settings(&Settings::with_defaults())
    }
}

impl SupervisorOptions {
    /// Derive options from persisted settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            monitor_interval: settings.effective_monitor_interval(),
            stop_timeout: settings.effective_stop_timeout(),
            restart_settle: settings.effective_restart_settle(),
        }
    }
}

/// Everything bound to one process run.
struct ActiveRun {
    id: RunId,
    handle: ProcessHandle,
    /// Flips to `true` once the consumer has drained the output.
    output_done: watch::Receiver<bool>,
}

struct Slot {
    state: LifecycleState,
    run: Option<ActiveRun>,
    last_spec: Option<LaunchSpec>,
}

struct Inner {
    slot: Mutex<Slot>,
    state_tx: watch::Sender<LifecycleState>,
    events: Arc<ServerEventBroadcaster>,
    console: Arc<ConsoleLog>,
    telemetry: Arc<TelemetryStore>,
    output: Arc<dyn OutputSinkPort>,
    acknowledgement: Arc<dyn AcknowledgementPort>,
    options: SupervisorOptions,
    next_run: AtomicU64,
}

/// Fans each console line out to the history, the event stream and an
/// optional embedder sink.
struct OutputFanout {
    console: Arc<ConsoleLog>,
    events: Arc<ServerEventBroadcaster>,
    external: Arc<dyn OutputSinkPort>,
}

impl OutputSinkPort for OutputFanout {
    fn append(&self, line: &OutputLine) {
        self.console.append(line);
        self.external.append(line);
        self.events.append(line);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The single place lifecycle state changes.
    fn transition(&self, slot: &mut Slot, change: StateChange) -> bool {
        if !slot.state.can_transition_to(change.state) {
            warn!(from = %slot.state, to = %change.state, "rejected lifecycle transition");
            return false;
        }

        debug!(from = %slot.state, to = %change.state, reason = ?change.reason, "lifecycle transition");
        slot.state = change.state;
        self.state_tx.send_replace(change.state);
        self.events.broadcast(ServerEvent::State(change));
        true
    }

    fn notice(&self, text: impl Into<String>) {
        self.output.append(&OutputLine::manager(text));
    }
}

/// Lifecycle Supervisor.
///
/// Cheap to clone; every clone drives the same server.
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    /// Create a supervisor.
    pub fn new(acknowledgement: Arc<dyn AcknowledgementPort>, options: SupervisorOptions) -> Self {
        Self::with_output_sink(acknowledgement, options, Arc::new(NoopOutputSink))
    }

    /// Create a supervisor that also forwards every console line to `sink`.
    pub fn with_output_sink(
        acknowledgement: Arc<dyn AcknowledgementPort>,
        options: SupervisorOptions,
        sink: Arc<dyn OutputSinkPort>,
    ) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Offline);
        let events = Arc::new(ServerEventBroadcaster::new());
        let console = Arc::new(ConsoleLog::new());
        let output = Arc::new(OutputFanout {
            console: console.clone(),
            events: events.clone(),
            external: sink,
        });

        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(Slot {
                    state: LifecycleState::Offline,
                    run: None,
                    last_spec: None,
                }),
                state_tx,
                events,
                console,
                telemetry: Arc::new(TelemetryStore::new()),
                output,
                acknowledgement,
                options,
                next_run: AtomicU64::new(1),
            }),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.inner.lock().state
    }

    /// Watch the lifecycle state. The receiver always holds the latest value.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.inner.state_tx.subscribe()
    }

    /// Subscribe to state, output and telemetry events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.inner.events.subscribe()
    }

    /// Latest telemetry figures.
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.inner.telemetry.snapshot()
    }

    /// Console history of the current (or last) run, oldest first.
    pub fn console_history(&self) -> Vec<OutputLine> {
        self.inner.console.lines()
    }

    /// Process id of the running server.
    pub fn pid(&self) -> Option<u32> {
        self.inner.lock().run.as_ref().map(|run| run.handle.pid())
    }

    /// Launch spec of the most recent successful start.
    pub fn last_launch_spec(&self) -> Option<LaunchSpec> {
        self.inner.lock().last_spec.clone()
    }

    /// Timing options in effect.
    pub fn options(&self) -> SupervisorOptions {
        self.inner.options
    }

    /// Wait until the state equals `target`, up to `limit`.
    ///
    /// Returns `false` on timeout.
    pub async fn wait_for_state(&self, target: LifecycleState, limit: Duration) -> bool {
        let mut rx = self.subscribe_state();
        matches!(
            timeout(limit, rx.wait_for(|state| *state == target)).await,
            Ok(Ok(_))
        )
    }

    /// Launch the server.
    ///
    /// Preconditions are checked before any state change: the server must
    /// be offline, the memory ceilings valid, the artifact present and the
    /// licence acknowledged. On success the state is `Online`, meaning the
    /// process exists and its streams are attached, not that the world has
    /// finished loading.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime: the run's workers and
    /// the process reaper are spawned onto it. Precondition failures return
    /// before anything is spawned.
    pub fn start(&self, spec: LaunchSpec) -> Result<RunId, SupervisorError> {
        let inner = &self.inner;
        let mut slot = inner.lock();

        if slot.state != LifecycleState::Offline {
            return Err(SupervisorError::invalid_state("start", slot.state));
        }
        spec.validate()?;
        let artifact = spec.resolve_artifact()?;
        if !inner.acknowledgement.is_acknowledged() {
            return Err(SupervisorError::PreconditionUnmet(
                "the Minecraft EULA has not been accepted".to_string(),
            ));
        }

        let run_id = RunId::new(inner.next_run.fetch_add(1, Ordering::Relaxed));
        inner.transition(
            &mut slot,
            StateChange::new(LifecycleState::Offline, LifecycleState::Starting),
        );
        inner.console.clear();
        inner.notice("Starting server...");

        info!(
            run = %run_id,
            artifact = %artifact.display(),
            working_dir = %spec.working_dir.display(),
            min_ram_gb = spec.min_ram_gb,
            max_ram_gb = spec.max_ram_gb,
            "launching server"
        );

        let spawned = build_launch_command(&spec, &artifact)
            .spawn()
            .and_then(|child| match child.id() {
                Some(pid) => Ok((child, pid)),
                None => Err(std::io::Error::other(
                    "server exited before its process id could be read",
                )),
            });

        let (mut child, pid) = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!(run = %run_id, error = %e, "failed to launch server");
                inner.notice(format!("Failed to start server: {e}"));
                inner.transition(
                    &mut slot,
                    StateChange::new(LifecycleState::Starting, LifecycleState::Offline)
                        .with_reason(StopReason::LaunchFailed),
                );
                return Err(SupervisorError::LaunchFailure(e));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let handle = ProcessHandle::adopt(child, pid);

        inner
            .telemetry
            .reset(run_id, spec.ram_ceiling_mb(), handle.started_at());
        inner.transition(
            &mut slot,
            StateChange::new(LifecycleState::Starting, LifecycleState::Online),
        );
        info!(run = %run_id, pid = %pid, "server process started");

        let (output_done_tx, output_done) = watch::channel(false);
        slot.run = Some(ActiveRun {
            id: run_id,
            handle: handle.clone(),
            output_done,
        });
        slot.last_spec = Some(spec);
        drop(slot);

        let (line_tx, line_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        if let Some(stdout) = stdout {
            spawn_stream_pump(stdout, run_id, "stdout", line_tx.clone());
        }
        if let Some(stderr) = stderr {
            spawn_stream_pump(stderr, run_id, "stderr", line_tx);
        }

        let supervisor = self.clone();
        let liveness = handle.liveness().clone();
        let sink = inner.output.clone();
        let telemetry = inner.telemetry.clone();
        tokio::spawn(async move {
            consume_output(run_id, line_rx, liveness, sink, telemetry).await;
            output_done_tx.send_replace(true);
            supervisor.on_output_closed(run_id).await;
        });

        ResourceMonitor::new(
            run_id,
            pid,
            handle.liveness().clone(),
            handle.started(),
            inner.options.monitor_interval,
            inner.telemetry.clone(),
            inner.events.clone(),
        )
        .spawn();

        Ok(run_id)
    }

    /// Ask the server to shut down.
    ///
    /// Writes the stop command and returns; a background waiter confirms
    /// the exit and tears the run down. If the server has not exited after
    /// `wait` (default: the configured stop timeout) it is terminated.
    /// If the stop command cannot be written the process is terminated
    /// right away and the write error is returned; the state still reaches
    /// `Offline`.
    pub async fn stop(&self, wait: Option<Duration>) -> Result<(), SupervisorError> {
        let inner = &self.inner;
        let (run_id, handle, mut output_done) = {
            let mut slot = inner.lock();
            let bound = match (&slot.state, &slot.run) {
                (LifecycleState::Online, Some(run)) => {
                    (run.id, run.handle.clone(), run.output_done.clone())
                }
                _ => return Err(SupervisorError::invalid_state("stop", slot.state)),
            };
            inner.transition(
                &mut slot,
                StateChange::new(LifecycleState::Online, LifecycleState::Stopping),
            );
            bound
        };

        inner.notice("Stopping server...");
        info!(run = %run_id, pid = %handle.pid(), "stopping server");

        let written = handle.input().write_line(STOP_COMMAND).await;
        let wait = wait.unwrap_or(inner.options.stop_timeout);
        let delivered = written.is_ok();

        let supervisor = self.clone();
        tokio::spawn(async move {
            let exit = if delivered {
                wait_or_terminate(&handle, wait).await
            } else {
                terminate(&handle, TERMINATE_GRACE).await
            };
            // Let the last lines reach the console before reporting Offline.
            if timeout(OUTPUT_DRAIN_GRACE, output_done.wait_for(|done| *done))
                .await
                .is_err()
            {
                debug!(run = %run_id, "output still open after exit, tearing down anyway");
            }
            supervisor.finish_run(run_id, exit).await;
        });

        written.map_err(|e| {
            warn!(run = %run_id, error = %e, "failed to deliver stop command, terminating");
            SupervisorError::StreamIo(e)
        })
    }

    /// Stop, wait for confirmed `Offline`, pause, then start again with the
    /// last launch spec.
    ///
    /// The second start only happens once teardown of the first run has
    /// completed. If something else starts the server during the pause,
    /// the start fails with `InvalidState` instead of launching twice.
    pub async fn restart(&self) -> Result<RunId, SupervisorError> {
        let spec = {
            let slot = self.inner.lock();
            match (&slot.state, &slot.last_spec) {
                (LifecycleState::Online, Some(spec)) => spec.clone(),
                _ => return Err(SupervisorError::invalid_state("restart", slot.state)),
            }
        };

        self.inner.notice("Restarting server...");
        let mut state_rx = self.subscribe_state();
        match self.stop(None).await {
            Ok(()) => {}
            Err(SupervisorError::StreamIo(e)) => {
                warn!(error = %e, "stop command failed during restart, server is being terminated");
            }
            Err(e) => return Err(e),
        }

        if state_rx
            .wait_for(|state| *state == LifecycleState::Offline)
            .await
            .is_err()
        {
            return Err(SupervisorError::invalid_state("restart", self.state()));
        }

        sleep(self.inner.options.restart_settle).await;
        self.start(spec)
    }

    /// Send a console command to the server.
    ///
    /// The command is echoed to the console as `> command`. Blank commands
    /// are ignored. `stop` is routed through [`Supervisor::stop`] so the
    /// resulting exit is not mistaken for a crash.
    pub async fn send_command(&self, command: &str) -> Result<(), SupervisorError> {
        let command = command.trim();

        let input = {
            let slot = self.inner.lock();
            match (&slot.state, &slot.run) {
                (LifecycleState::Online, Some(run)) => run.handle.input().clone(),
                _ => return Err(SupervisorError::invalid_state("send a command", slot.state)),
            }
        };

        if command.is_empty() {
            return Ok(());
        }

        self.inner.output.append(&OutputLine::operator(command));
        if command.eq_ignore_ascii_case(STOP_COMMAND) {
            return self.stop(None).await;
        }

        debug!(%command, "sending console command");
        input
            .write_line(command)
            .await
            .map_err(SupervisorError::StreamIo)
    }

    /// Called by the consumer task when a run's output has closed.
    async fn on_output_closed(&self, run_id: RunId) {
        let handle = {
            let slot = self.inner.lock();
            match &slot.run {
                Some(run) if run.id == run_id && slot.state == LifecycleState::Online => {
                    run.handle.clone()
                }
                // Stopping: the stop waiter owns teardown. Otherwise stale.
                _ => return,
            }
        };

        debug!(run = %run_id, "server output closed while online");
        let exit = match timeout(EXIT_CONFIRM_GRACE, handle.liveness().wait_exit()).await {
            Ok(exit) => exit,
            Err(_) => {
                warn!(run = %run_id, pid = %handle.pid(), "output closed but server still running, killing it");
                handle.force_kill();
                handle.liveness().wait_exit().await
            }
        };
        self.finish_run(run_id, exit).await;
    }

    /// Tear down `run_id` once its process has exited.
    ///
    /// Whether this was a requested stop or a crash is decided here from
    /// the state at teardown time.
    async fn finish_run(&self, run_id: RunId, exit: Option<ProcessExit>) {
        let inner = &self.inner;
        let code = exit.and_then(|e| e.code);

        let (run, reason) = {
            let mut slot = inner.lock();
            let Some(run) = slot.run.take_if(|run| run.id == run_id) else {
                debug!(run = %run_id, "ignoring completion of a run that is no longer current");
                return;
            };

            let reason = if slot.state == LifecycleState::Stopping {
                StopReason::Requested
            } else {
                StopReason::Crashed
            };

            let previous = slot.state;
            inner.telemetry.clear();
            inner.transition(
                &mut slot,
                StateChange::new(previous, LifecycleState::Offline)
                    .with_reason(reason)
                    .with_exit_code(code),
            );
            (run, reason)
        };

        match reason {
            StopReason::Crashed => {
                warn!(run = %run_id, exit_code = ?code, "server stopped unexpectedly");
                inner.notice(match code {
                    Some(code) => format!("Server stopped unexpectedly (exit code {code})."),
                    None => "Server stopped unexpectedly.".to_string(),
                });
            }
            StopReason::Requested | StopReason::LaunchFailed => {
                info!(run = %run_id, exit_code = ?code, "server stopped");
                inner.notice("Server stopped.");
            }
        }

        run.handle.input().close().await;
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("state", &self.state())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use std::path::PathBuf;
    use zcraft_core::StaticAcknowledgement;

    mock! {
        Ack {}
        impl AcknowledgementPort for Ack {
            fn is_acknowledged(&self) -> bool;
        }
    }

    fn supervisor(ack: bool) -> Supervisor {
        Supervisor::new(
            Arc::new(StaticAcknowledgement(ack)),
            SupervisorOptions::default(),
        )
    }

    fn jar_dir() -> (tempfile::TempDir, LaunchSpec) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("server.jar"), b"not really a jar").unwrap();
        let spec = LaunchSpec::new("server.jar", dir.path(), 1, 2);
        (dir, spec)
    }

    #[test]
    fn test_default_options() {
        let options = SupervisorOptions::default();
        assert_eq!(options.monitor_interval, Duration::from_secs(2));
        assert_eq!(options.stop_timeout, Duration::from_secs(30));
        assert_eq!(options.restart_settle, Duration::from_secs(3));
    }

    #[test]
    fn test_start_precondition_failures_need_no_runtime() {
        let sup = supervisor(false);
        let (_dir, spec) = jar_dir();

        let err = sup.start(spec).unwrap_err();
        assert!(matches!(err, SupervisorError::PreconditionUnmet(_)));
        assert_eq!(sup.state(), LifecycleState::Offline);
    }

    #[tokio::test]
    async fn test_start_requires_artifact() {
        let sup = supervisor(true);
        let spec = LaunchSpec::new("missing.jar", PathBuf::from("/nonexistent/zcraft"), 1, 2);

        let err = sup.start(spec).unwrap_err();
        assert!(matches!(err, SupervisorError::ArtifactMissing(_)));
        assert_eq!(sup.state(), LifecycleState::Offline);
    }

    #[tokio::test]
    async fn test_start_requires_acknowledgement() {
        let mut ack = MockAck::new();
        ack.expect_is_acknowledged().times(1).return_const(false);
        let sup = Supervisor::new(Arc::new(ack), SupervisorOptions::default());
        let (_dir, spec) = jar_dir();

        let err = sup.start(spec).unwrap_err();
        assert!(matches!(err, SupervisorError::PreconditionUnmet(_)));
        assert_eq!(sup.state(), LifecycleState::Offline);
    }

    #[tokio::test]
    async fn test_start_rejects_invalid_ceilings() {
        let sup = supervisor(true);
        let (_dir, mut spec) = jar_dir();
        spec.min_ram_gb = 4;
        spec.max_ram_gb = 2;

        assert!(matches!(
            sup.start(spec),
            Err(SupervisorError::InvalidLaunchSpec(_))
        ));
    }

    #[tokio::test]
    async fn test_launch_failure_reverts_to_offline() {
        let sup = supervisor(true);
        let mut events = sup.subscribe();
        let (_dir, spec) = jar_dir();
        let spec = spec.with_java("/nonexistent/zcraft/java");

        let err = sup.start(spec).unwrap_err();
        assert!(matches!(err, SupervisorError::LaunchFailure(_)));
        assert_eq!(sup.state(), LifecycleState::Offline);
        assert!(sup.pid().is_none());

        let mut states = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let Some(change) = event.as_state() {
                states.push((change.state, change.reason));
            }
        }
        assert_eq!(
            states,
            [
                (LifecycleState::Starting, None),
                (LifecycleState::Offline, Some(StopReason::LaunchFailed)),
            ]
        );
    }

    #[tokio::test]
    async fn test_operations_rejected_while_offline() {
        let sup = supervisor(true);

        assert!(matches!(
            sup.stop(None).await,
            Err(SupervisorError::InvalidState {
                state: LifecycleState::Offline,
                ..
            })
        ));
        assert!(matches!(
            sup.send_command("list").await,
            Err(SupervisorError::InvalidState { .. })
        ));
        assert!(matches!(
            sup.restart().await,
            Err(SupervisorError::InvalidState { .. })
        ));
        assert_eq!(sup.state(), LifecycleState::Offline);
    }
}
