//! Status command implementation

use crate::output::OutputFormatter;
use anyhow::Result;
use pathwarden_core::PathWarden;
use std::process::ExitCode;

pub fn execute(warden: &PathWarden, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    formatter.format_status(&warden.status())?;
    Ok(ExitCode::SUCCESS)
}
