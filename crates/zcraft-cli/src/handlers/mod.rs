//! Command handlers.
//!
//! Handlers are thin wrappers that:
//! 1. Resolve paths and settings from the [`CliContext`](crate::CliContext)
//! 2. Call the runtime adapters
//! 3. Format output for the terminal

pub mod config;
pub mod eula;
pub mod properties;
pub mod run;
pub mod scripts;
