//! CLI entry point - the composition root.
//!
//! Parses arguments, initialises logging, loads settings and dispatches to
//! a handler. Errors are printed once here and mapped to an exit code.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use zcraft_cli::handlers::run::RunArgs;
use zcraft_cli::{Cli, CliError, Commands, bootstrap, handlers};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let mut ctx = bootstrap(cli.config, cli.server_dir)?;

    match command {
        Commands::Run {
            min_ram,
            max_ram,
            jar,
        } => {
            let args = RunArgs {
                min_ram,
                max_ram,
                jar,
            };
            handlers::run::execute(&ctx, args).await?;
        }
        Commands::Eula { command } => handlers::eula::execute(&ctx, &command)?,
        Commands::Scripts => handlers::scripts::execute(&ctx)?,
        Commands::Properties { command } => handlers::properties::execute(&ctx, command)?,
        Commands::Config { command } => handlers::config::execute(&mut ctx, command)?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = dispatch(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}
