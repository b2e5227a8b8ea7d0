//! Main commands enum and primary subcommands.

use clap::Subcommand;
use std::path::PathBuf;

use crate::config_commands::ConfigCommand;

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the server and attach an interactive console
    Run {
        /// Minimum heap in GB for this run
        #[arg(long = "min-ram")]
        min_ram: Option<u32>,
        /// Maximum heap in GB for this run
        #[arg(long = "max-ram")]
        max_ram: Option<u32>,
        /// Server jar to launch, relative to the server directory unless absolute
        #[arg(long)]
        jar: Option<PathBuf>,
    },

    /// Show or accept the Minecraft EULA
    Eula {
        #[command(subcommand)]
        command: EulaCommand,
    },

    /// Generate start.sh and start.bat in the server directory
    Scripts,

    /// View or edit server.properties
    Properties {
        #[command(subcommand)]
        command: PropertiesCommand,
    },

    /// View or change manager settings
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// EULA command variants.
#[derive(Subcommand)]
pub enum EulaCommand {
    /// Show whether the EULA has been accepted
    Status,
    /// Accept the EULA by writing eula.txt
    Accept,
}

/// Properties command variants.
#[derive(Subcommand)]
pub enum PropertiesCommand {
    /// List every property
    List,
    /// Print one property
    Get {
        /// Property key, e.g. `motd`
        key: String,
    },
    /// Set one property
    Set {
        /// Property key
        key: String,
        /// New value
        value: String,
    },
    /// Restore the well-known properties to their defaults
    Reset,
}
