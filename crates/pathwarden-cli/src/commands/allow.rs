//! Allow-list command implementations

use crate::cli::AllowAddArgs;
use crate::cli::AllowPathArgs;
use crate::error::convert_warden_error;
use crate::output::OutputFormatter;
use anyhow::Result;
use pathwarden_core::PathWarden;
use pathwarden_core::SecurityMode;
use pathwarden_core::allowlist::AddOptions;
use pathwarden_core::allowlist::AllowMatch;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// An entry added to or removed from the allow-list.
#[derive(Debug, Serialize)]
pub struct AllowChange {
    pub action: &'static str,
    pub directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<PathBuf>,
}

/// Result of `allow test`.
#[derive(Debug, Serialize)]
pub struct AllowTestOutcome {
    pub path: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<AllowMatch>,
}

pub fn add(args: &AllowAddArgs, warden: &PathWarden, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let options = AddOptions {
        create_if_missing: args.create,
        validate_exists: !args.no_validate,
    };
    let root = warden
        .allow_list()
        .add(&args.directory, options)
        .map_err(|e| convert_warden_error(&e, warden.mode()))?;

    warn_if_inactive(warden, formatter);
    formatter.format_allow_change(&AllowChange {
        action: "added",
        directory: root.original().to_string(),
        normalized: Some(root.normalized().to_path_buf()),
    })?;
    Ok(ExitCode::SUCCESS)
}

pub fn remove(args: &AllowPathArgs, warden: &PathWarden, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let removed = warden
        .allow_list()
        .remove(&args.path)
        .map_err(|e| convert_warden_error(&e, warden.mode()))?;

    if warden.mode() == SecurityMode::Sandboxed && warden.allow_list().is_empty() {
        formatter.format_warning("the allow-list is now empty; every path will be rejected in sandboxed mode");
    }
    formatter.format_allow_change(&AllowChange {
        action: "removed",
        directory: removed,
        normalized: None,
    })?;
    Ok(ExitCode::SUCCESS)
}

pub fn list(warden: &PathWarden, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    formatter.format_allow_list(&warden.allow_list().list())?;
    Ok(ExitCode::SUCCESS)
}

/// Exits with failure when no entry covers the path, so scripts can branch
/// on the result.
pub fn test(args: &AllowPathArgs, warden: &PathWarden, formatter: &dyn OutputFormatter) -> Result<ExitCode> {
    let matched = warden
        .allow_list()
        .is_path_allowed(&args.path)
        .map_err(|e| convert_warden_error(&e, warden.mode()))?;

    let allowed = matched.is_some();
    formatter.format_allow_test(&AllowTestOutcome {
        path: args.path.clone(),
        allowed,
        matched,
    })?;
    Ok(if allowed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn warn_if_inactive(warden: &PathWarden, formatter: &dyn OutputFormatter) {
    if warden.mode() != SecurityMode::Sandboxed {
        formatter.format_warning(&format!(
            "the allow-list only applies in sandboxed mode (current mode: {})",
            warden.mode()
        ));
    }
}
