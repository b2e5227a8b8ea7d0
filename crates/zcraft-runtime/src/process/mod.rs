//! Process management infrastructure for the supervised server.
//!
//! # Structure
//!
//! - `ProcessHandle` - Spawned process with reaper task, command input and liveness
//! - `build_launch_command` - The fixed `java ... -jar <artifact> nogui` launch
//! - `spawn_stream_pump` - Lossy line readers for stdout/stderr
//! - `ConsoleLog` - Console history ring buffer
//! - `ServerEventBroadcaster` - Event fan-out to control surfaces
//! - `shutdown` - SIGTERM → SIGKILL escalation

mod broadcaster;
mod command;
mod handle;
mod logs;
pub mod shutdown;
mod stream;

pub use broadcaster::ServerEventBroadcaster;
pub use command::build_launch_command;
pub use handle::{CommandInput, Liveness, ProcessExit, ProcessHandle, RunId};
pub use logs::{ConsoleLog, MAX_CONSOLE_LINES};
pub use shutdown::{TERMINATE_GRACE, terminate, wait_or_terminate};
pub(crate) use stream::{LINE_CHANNEL_CAPACITY, spawn_stream_pump};
