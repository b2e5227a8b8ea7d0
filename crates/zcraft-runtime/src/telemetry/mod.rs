//! Telemetry: console-line parsing, the shared store and resource sampling.

mod monitor;
mod parser;
mod store;

pub use monitor::ResourceMonitor;
pub use parser::{LineSignals, PlayerDelta, parse_line};
pub use store::TelemetryStore;
