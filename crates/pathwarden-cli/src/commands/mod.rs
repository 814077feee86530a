//! Command implementations.

pub mod allow;
pub mod archive;
pub mod check;
pub mod completion;
pub mod status;

use crate::cli::AllowCommand;
use crate::cli::ArchiveCommand;
use crate::cli::Cli;
use crate::cli::Commands;
use crate::error::convert_warden_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use pathwarden_core::PathWarden;
use pathwarden_core::SecurityMode;
use pathwarden_core::config::resolve_config_path;
use std::process::ExitCode;

/// Dispatches the parsed command line.
pub fn run(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    if let Commands::Completion(args) = &cli.command {
        completion::execute(args.shell);
        return Ok(ExitCode::SUCCESS);
    }

    let warden = load_warden(cli)?;

    match &cli.command {
        Commands::Status => status::execute(&warden, formatter),
        Commands::Check(args) => check::execute(args, &warden, formatter),
        Commands::Allow(AllowCommand::Add(args)) => allow::add(args, &warden, formatter),
        Commands::Allow(AllowCommand::Remove(args)) => allow::remove(args, &warden, formatter),
        Commands::Allow(AllowCommand::List) => allow::list(&warden, formatter),
        Commands::Allow(AllowCommand::Test(args)) => allow::test(args, &warden, formatter),
        Commands::Archive(ArchiveCommand::Check(args)) => {
            archive::check(args, &warden, formatter, cli.quiet || cli.json)
        }
        Commands::Completion(_) => Ok(ExitCode::SUCCESS),
    }
}

fn load_warden(cli: &Cli) -> Result<PathWarden> {
    // the mode is unknown until the file parses; strict guidance is the safe default
    let to_cli = |e| convert_warden_error(&e, SecurityMode::Strict);
    let path = resolve_config_path(cli.config.as_deref()).map_err(to_cli)?;
    let warden = PathWarden::load(&path).map_err(to_cli)?;
    tracing::debug!(config = %path.display(), mode = %warden.mode(), "configuration loaded");
    Ok(warden)
}
