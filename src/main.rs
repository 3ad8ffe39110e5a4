use std::process;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use s3backup::commands::{self, Cli, Commands};
use s3backup::sysexits;

/// Entry point for the s3backup CLI application.
/// Parses command-line arguments and dispatches to the matching handler.
fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let Some(command) = cli.commands else {
        eprintln!("s3bk requires a command to execute. See 's3bk --help' for usage.");
        process::exit(sysexits::EX_KEYWORD);
    };

    match command {
        Commands::Run { name } => {
            commands::run(cli.config, name)?;
        }
        Commands::List => {
            commands::list(cli.config)?;
        }
        Commands::Config => {
            commands::config(cli.config)?;
        }
    }
    Ok(())
}
