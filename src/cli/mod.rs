//! Command Line Interface module
//!
//! This module contains the CLI argument parsing and command implementations.

pub mod args;
pub mod commands;

pub use args::*;

use anyhow::Result;
use std::sync::Arc;

use crate::config::IdeConfig;
use crate::utils::logging;

/// Main CLI application runner
pub async fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // Watch mode keeps running in the terminal, so its log goes to a file
    if matches!(cli.command, Commands::Tags { watch: true }) {
        let log_path = logging::init_file_logging(cli.verbose, cli.quiet)?;
        println!("📝 Logging to {}", log_path.display());
    } else {
        logging::init_cli_logging(cli.verbose, cli.quiet)?;
    }

    let config = Arc::new(IdeConfig::load(cli.config.as_deref())?);
    log::debug!("Application directory: {}", config.app_dir.display());

    commands::execute_command(cli.command.clone(), &cli, config).await
}
