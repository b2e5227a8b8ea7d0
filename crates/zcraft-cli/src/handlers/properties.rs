//! Properties command handler.

use anyhow::Result;
use zcraft_core::PropertiesError;
use zcraft_runtime::{load_properties, properties_path, save_properties};

use crate::bootstrap::CliContext;
use crate::commands::PropertiesCommand;
use crate::error::CliError;

/// Execute the properties command.
pub fn execute(ctx: &CliContext, command: PropertiesCommand) -> Result<()> {
    let server_dir = ctx.server_dir();
    let mut props = load_properties(&server_dir).map_err(CliError::from)?;

    match command {
        PropertiesCommand::List => {
            let width = props.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
            for (key, value) in props.iter() {
                println!("{key:<width$} = {value}");
            }
        }
        PropertiesCommand::Get { key } => match props.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(CliError::from(PropertiesError::UnknownKey(key)).into()),
        },
        PropertiesCommand::Set { key, value } => {
            props.set(&key, &value).map_err(CliError::from)?;
            save_properties(&server_dir, &props).map_err(CliError::from)?;
            println!("✓ {key} = {value}");
        }
        PropertiesCommand::Reset => {
            props.reset_to_defaults();
            save_properties(&server_dir, &props).map_err(CliError::from)?;
            println!(
                "✓ Restored defaults in {}",
                properties_path(&server_dir).display()
            );
        }
    }
    Ok(())
}
