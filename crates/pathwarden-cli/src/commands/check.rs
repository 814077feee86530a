//! Check command implementation

use crate::cli::CheckArgs;
use crate::error::convert_warden_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use pathwarden_core::PathWarden;
use pathwarden_core::SecurityMode;
use pathwarden_core::ValidationRequest;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// A path that passed validation.
#[derive(Debug, Serialize)]
pub struct CheckOutcome {
    pub input: String,
    pub mode: SecurityMode,
    pub real_path: PathBuf,
    pub exists: bool,
}

pub fn execute(args: &CheckArgs, warden: &PathWarden, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let request = ValidationRequest::new(args.path.as_str())
        .require_exists(args.must_exist)
        .check_write(args.writable)
        .resolve_symlinks(!args.no_follow);

    let real = warden
        .validate(&request)
        .map_err(|e| convert_warden_error(&e, warden.mode()))?;

    formatter.format_check(&CheckOutcome {
        input: args.path.clone(),
        mode: warden.mode(),
        exists: real.existed(),
        real_path: real.into_path_buf(),
    })?;

    Ok(ExitCode::SUCCESS)
}
