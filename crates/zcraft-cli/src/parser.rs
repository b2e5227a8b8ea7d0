//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;
use std::path::PathBuf;

use crate::commands::Commands;

/// Command-line interface definition for the server manager.
///
/// This is the top-level parser that handles global options and dispatches
/// to subcommands.
#[derive(Parser)]
#[command(name = "zcraft")]
#[command(about = "Run and manage a local Minecraft server")]
#[command(version)]
pub struct Cli {
    /// Settings file to use instead of the platform default
    #[arg(long, global = true, env = "ZCRAFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the server directory for this invocation
    #[arg(long = "server-dir", global = true)]
    pub server_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
