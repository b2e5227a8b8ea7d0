//! Domain types for the supervised server.

mod launch;
mod lifecycle;
mod telemetry;

pub use launch::{DEFAULT_ARTIFACT_NAME, DEFAULT_JAVA, LaunchSpec, MAX_RAM_GB};
pub use lifecycle::LifecycleState;
pub use telemetry::{NOMINAL_TICK_RATE, TelemetrySnapshot, TickRateHealth, format_uptime};
