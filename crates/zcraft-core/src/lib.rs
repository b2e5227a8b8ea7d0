//! Domain types and port definitions for zcraft.
//!
//! This crate has no process or OS code. The runtime crate implements the
//! ports and drives the lifecycle; control surfaces consume [`ServerEvent`]s.
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod eula;
pub mod events;
pub mod ports;
pub mod properties;
pub mod settings;

pub use domain::{
    DEFAULT_ARTIFACT_NAME, DEFAULT_JAVA, LaunchSpec, LifecycleState, MAX_RAM_GB,
    NOMINAL_TICK_RATE, TelemetrySnapshot, TickRateHealth, format_uptime,
};
pub use eula::{EULA_FILE_NAME, EULA_URL, EulaError};
pub use events::{OutputLine, OutputSource, ServerEvent, StateChange, StopReason};
pub use ports::{
    AcknowledgementPort, NoopOutputSink, OutputSinkPort, StaticAcknowledgement, SupervisorError,
};
pub use properties::{
    DEFAULT_PROPERTIES, PROPERTIES_FILE_NAME, PropertiesError, ServerProperties,
};
pub use settings::{
    DEFAULT_MAX_RAM_GB, DEFAULT_MIN_RAM_GB, DEFAULT_SERVER_DIR, Settings, SettingsError,
    SettingsUpdate, validate_settings,
};
