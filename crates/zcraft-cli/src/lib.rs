//! Terminal control surface for zcraft.
//!
//! `main.rs` is the composition root; everything it dispatches to lives here
//! so it can be unit tested.
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Logging is initialised by the binary.
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod config_commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::{Commands, EulaCommand, PropertiesCommand};
pub use config_commands::ConfigCommand;
pub use error::CliError;
pub use parser::Cli;
