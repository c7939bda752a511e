//! sitemapper CLI - batch URL streams into gzip sitemaps and indexes
//!
//! This is the main entry point for the sitemapper command-line interface.
//! Command implementations live in [`commands`].

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod error;
mod utils;

use cli::{Cli, Commands};
use error::exit_code_from_error;
use utils::settings::load_config;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = utils::logging::initialize_logging(&cli) {
        eprintln!("Error: failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match execute_command(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code_from_error(&err))
        },
    }
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Generate(args) => {
            commands::generate::execute(args, load_config(config_path)?).await
        },
        Commands::Index(args) => commands::index::execute(&args, load_config(config_path)?),
        Commands::Inspect(args) => commands::inspect::execute(&args),
        Commands::Ping(args) => commands::ping::execute(args, load_config(config_path)?).await,
    }
}
