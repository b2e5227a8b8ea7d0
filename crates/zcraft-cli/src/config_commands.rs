//! Configuration management subcommands.

use clap::Subcommand;
use std::path::PathBuf;

/// Configuration management commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show all current settings
    Show,
    /// Set the default memory range
    SetRam {
        /// Minimum heap in GB
        #[arg(long)]
        min: u32,
        /// Maximum heap in GB
        #[arg(long)]
        max: u32,
    },
    /// Set the Java executable used to launch the server
    SetJava {
        /// Path to `java`, or a command name on PATH
        path: PathBuf,
    },
}
