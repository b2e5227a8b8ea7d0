//! Process supervision and OS-level concerns for zcraft.
//!
//! The [`Supervisor`] drives one game server process through the
//! `Offline → Starting → Online → Stopping → Offline` lifecycle, streams
//! its console, samples its resource usage and publishes everything as
//! [`zcraft_core::ServerEvent`]s. The remaining modules are file adapters
//! for the server directory (EULA, `server.properties`, launch scripts)
//! and the manager's own settings.
#![deny(unsafe_code)]

pub mod eula;
pub mod process;
pub mod properties_file;
pub mod scripts;
pub mod settings_file;
pub mod supervisor;
pub mod telemetry;

pub use eula::EulaFile;
pub use process::{ConsoleLog, ProcessHandle, RunId, ServerEventBroadcaster};
pub use properties_file::{load_properties, properties_path, save_properties};
pub use scripts::{LaunchScripts, write_launch_scripts};
pub use settings_file::{
    CONFIG_ENV_VAR, SettingsFileError, default_settings_path, load_settings, save_settings,
};
pub use supervisor::{STOP_COMMAND, Supervisor, SupervisorOptions};
pub use telemetry::{TelemetryStore, parse_line};
