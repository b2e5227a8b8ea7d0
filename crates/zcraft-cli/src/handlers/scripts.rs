//! Launch script command handler.

use anyhow::Result;
use zcraft_runtime::write_launch_scripts;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Write `start.sh` and `start.bat` for the configured memory range.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let spec = ctx.launch_spec();
    let scripts = write_launch_scripts(&spec).map_err(CliError::from)?;
    println!("✓ Wrote {}", scripts.shell.display());
    println!("✓ Wrote {}", scripts.batch.display());
    Ok(())
}
