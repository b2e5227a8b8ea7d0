//! Config command handler.

use anyhow::Result;
use zcraft_core::Settings;

use crate::bootstrap::CliContext;
use crate::config_commands::ConfigCommand;

/// Execute the config command.
pub fn execute(ctx: &mut CliContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            print_settings(ctx);
        }
        ConfigCommand::SetRam { min, max } => {
            let settings = ctx.update_settings(|s| {
                s.min_ram_gb = Some(min);
                s.max_ram_gb = Some(max);
            })?;
            println!(
                "✓ Memory range set to {}-{} GB",
                settings.effective_min_ram_gb(),
                settings.effective_max_ram_gb()
            );
        }
        ConfigCommand::SetJava { path } => {
            ctx.update_settings(|s| s.java_path = Some(path.clone()))?;
            println!("✓ Java executable set to {}", path.display());
        }
    }
    Ok(())
}

fn print_settings(ctx: &CliContext) {
    let settings: &Settings = ctx.settings();
    let spec = settings.launch_spec();
    println!("Settings file:     {}", ctx.settings_path().display());
    println!("Server directory:  {}", spec.working_dir.display());
    println!("Server jar:        {}", spec.artifact_path.display());
    println!("Java:              {}", spec.java_path.display());
    println!("Memory:            {}-{} GB", spec.min_ram_gb, spec.max_ram_gb);
    println!(
        "Stop timeout:      {}s",
        settings.effective_stop_timeout().as_secs()
    );
    println!(
        "Monitor interval:  {}s",
        settings.effective_monitor_interval().as_secs()
    );
    println!(
        "Restart pause:     {}s",
        settings.effective_restart_settle().as_secs()
    );
}
