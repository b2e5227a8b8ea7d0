//! EULA command handler.

use anyhow::Result;
use zcraft_core::EULA_URL;
use zcraft_runtime::EulaFile;

use crate::bootstrap::CliContext;
use crate::commands::EulaCommand;
use crate::error::CliError;

/// Execute the eula command.
pub fn execute(ctx: &CliContext, command: &EulaCommand) -> Result<()> {
    let eula = EulaFile::in_dir(&ctx.server_dir());
    match command {
        EulaCommand::Status => {
            let accepted = eula.accepted().map_err(CliError::from)?;
            if accepted {
                println!("✓ EULA accepted ({})", eula.path().display());
            } else {
                println!("✗ EULA not accepted");
                println!("  Read it at {EULA_URL}");
                println!("  then run: zcraft eula accept");
            }
        }
        EulaCommand::Accept => {
            eula.accept().map_err(CliError::from)?;
            println!("✓ EULA accepted ({})", eula.path().display());
        }
    }
    Ok(())
}
