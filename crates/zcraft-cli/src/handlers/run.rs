//! Run command handler: start the server and attach a console.
//!
//! Lines typed on stdin are sent to the server. Lines starting with `:` are
//! handled locally:
//!
//! | input      | effect                               |
//! |------------|--------------------------------------|
//! | `:stop`    | graceful stop, console stays until offline |
//! | `:restart` | stop, pause, start again             |
//! | `:status`  | print state and telemetry            |
//! | `:quit`    | stop and exit                        |
//! | `:help`    | list local commands                  |
//!
//! Stop and restart run as background tasks so server output keeps
//! printing while they wait for the process to exit.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zcraft_core::{
    EULA_URL, LifecycleState, ServerEvent, StateChange, SupervisorError, validate_settings,
};
use zcraft_runtime::{EulaFile, RunId, STOP_COMMAND, Supervisor, SupervisorOptions};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::{format_event, format_status};

/// Per-run overrides from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub min_ram: Option<u32>,
    pub max_ram: Option<u32>,
    pub jar: Option<PathBuf>,
}

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Forward to the server.
    Command(String),
    Stop,
    Restart,
    Status,
    Quit,
    Help,
    /// A `:` command we do not know.
    Unknown(String),
    Empty,
}

impl ConsoleInput {
    /// Classify a line typed by the operator.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(local) = line.strip_prefix(':') else {
            return Self::Command(line.to_string());
        };
        match local.trim().to_ascii_lowercase().as_str() {
            "stop" => Self::Stop,
            "restart" => Self::Restart,
            "status" => Self::Status,
            "quit" | "q" | "exit" => Self::Quit,
            "help" | "?" => Self::Help,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Completion of a background stop or restart.
enum Outcome {
    Stopped(Result<(), SupervisorError>),
    Restarted(Result<RunId, SupervisorError>),
}

const HELP: &str = "\
Local commands:
  :stop      stop the server
  :restart   restart the server
  :status    show state and telemetry
  :quit      stop the server and exit
Anything else is sent to the server console.";

/// Execute the run command.
///
/// Returns an error if the server could not be started or if the run ended
/// in a crash.
pub async fn execute(ctx: &CliContext, args: RunArgs) -> Result<()> {
    let mut settings = ctx.settings().clone();
    if let Some(min) = args.min_ram {
        settings.min_ram_gb = Some(min);
    }
    if let Some(max) = args.max_ram {
        settings.max_ram_gb = Some(max);
    }
    if args.jar.is_some() {
        settings.artifact = args.jar;
    }
    validate_settings(&settings).map_err(|e| CliError::Arguments(e.to_string()))?;

    let spec = settings.launch_spec();
    let eula = Arc::new(EulaFile::in_dir(&spec.working_dir));
    let supervisor = Supervisor::new(eula, SupervisorOptions::from_settings(&settings));

    // Subscribe first so the Starting and Online transitions are printed.
    let mut events = supervisor.subscribe();
    if let Err(e) = supervisor.start(spec) {
        if matches!(e, SupervisorError::PreconditionUnmet(_)) {
            eprintln!("Read the EULA at {EULA_URL}");
            eprintln!("then run: zcraft eula accept");
        }
        return Err(CliError::from(e).into());
    }
    println!("Type :help for console commands.");

    let console = Console::new(supervisor);
    let last = console.attach(&mut events).await;

    match last {
        Some(change) if change.crashed() => {
            let detail = change
                .exit_code
                .map_or_else(String::new, |code| format!(" with exit code {code}"));
            Err(CliError::Process(format!("server crashed{detail}")).into())
        }
        _ => Ok(()),
    }
}

struct Console {
    supervisor: Supervisor,
    outcome_tx: mpsc::UnboundedSender<Outcome>,
    outcome_rx: mpsc::UnboundedReceiver<Outcome>,
    pending_restart: bool,
}

impl Console {
    fn new(supervisor: Supervisor) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            supervisor,
            outcome_tx,
            outcome_rx,
            pending_restart: false,
        }
    }

    /// Pump events, stdin and Ctrl+C until the server is offline for good.
    ///
    /// Returns the last state change seen.
    async fn attach(
        mut self,
        events: &mut tokio::sync::broadcast::Receiver<ServerEvent>,
    ) -> Option<StateChange> {
        let mut stdin = spawn_stdin_reader();
        let mut stdin_open = true;
        let mut interrupts = true;
        let mut last_change = None;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => {
                        if let Some(text) = format_event(&event) {
                            println!("{text}");
                        }
                        if let ServerEvent::State(change) = event {
                            let offline = change.state == LifecycleState::Offline;
                            last_change = Some(change);
                            if offline && self.finished() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "console fell behind, some lines were not shown");
                    }
                    Err(RecvError::Closed) => break,
                },

                line = stdin.recv(), if stdin_open => match line {
                    Some(Ok(line)) => self.handle_input(ConsoleInput::parse(&line)).await,
                    None => {
                        debug!("stdin closed, stopping server");
                        stdin_open = false;
                        self.request_stop();
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "cannot read console input, stopping server");
                        stdin_open = false;
                        self.request_stop();
                    }
                },

                Some(outcome) = self.outcome_rx.recv() => {
                    self.report(outcome);
                    if self.finished() {
                        break;
                    }
                }

                signal = tokio::signal::ctrl_c(), if interrupts => {
                    if let Err(e) = signal {
                        warn!(error = %e, "cannot listen for Ctrl+C");
                        interrupts = false;
                        continue;
                    }
                    println!("Interrupted, stopping server...");
                    self.request_stop();
                }
            }
        }

        last_change
    }

    /// No restart is in flight and the server is offline.
    fn finished(&self) -> bool {
        !self.pending_restart && self.supervisor.state() == LifecycleState::Offline
    }

    async fn handle_input(&mut self, input: ConsoleInput) {
        match input {
            ConsoleInput::Empty => {}
            ConsoleInput::Command(command) if command.eq_ignore_ascii_case(STOP_COMMAND) => {
                // Goes through send_command for the echo; it waits for exit.
                let supervisor = self.supervisor.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let result = supervisor.send_command(&command).await;
                    let _ = tx.send(Outcome::Stopped(result));
                });
            }
            ConsoleInput::Command(command) => {
                if let Err(e) = self.supervisor.send_command(&command).await {
                    eprintln!("{}", CliError::from(e));
                }
            }
            ConsoleInput::Quit if self.pending_restart => {
                println!("Wait for the restart to finish before quitting.");
            }
            ConsoleInput::Stop | ConsoleInput::Quit => self.request_stop(),
            ConsoleInput::Restart => self.request_restart(),
            ConsoleInput::Status => {
                let supervisor = &self.supervisor;
                println!(
                    "{}",
                    format_status(supervisor.state(), supervisor.pid(), &supervisor.telemetry())
                );
            }
            ConsoleInput::Help => println!("{HELP}"),
            ConsoleInput::Unknown(command) => {
                eprintln!("Unknown console command {command}, try :help");
            }
        }
    }

    fn request_stop(&self) {
        match self.supervisor.state() {
            LifecycleState::Stopping => {
                println!("Already stopping...");
                return;
            }
            LifecycleState::Offline => return,
            LifecycleState::Starting | LifecycleState::Online => {}
        }
        let supervisor = self.supervisor.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = supervisor.stop(None).await;
            let _ = tx.send(Outcome::Stopped(result));
        });
    }

    fn request_restart(&mut self) {
        if self.pending_restart {
            println!("Restart already in progress...");
            return;
        }
        self.pending_restart = true;
        let supervisor = self.supervisor.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = supervisor.restart().await;
            let _ = tx.send(Outcome::Restarted(result));
        });
    }

    fn report(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Stopped(Ok(())) => {}
            Outcome::Stopped(Err(e)) => {
                eprintln!("Stop failed: {}", CliError::from(e));
            }
            Outcome::Restarted(result) => {
                self.pending_restart = false;
                if let Err(e) = result {
                    eprintln!("Restart failed: {}", CliError::from(e));
                }
            }
        }
    }
}

/// Read stdin on a plain thread so a pending read never holds up runtime
/// shutdown. The channel closes at end of input.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}
