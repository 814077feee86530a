//! Archive check command implementation

use crate::cli::ArchiveCheckArgs;
use crate::error::convert_archive_error;
use crate::error::convert_warden_error;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use anyhow::anyhow;
use pathwarden_core::ArchiveValidator;
use pathwarden_core::PathWarden;
use pathwarden_core::ValidationRequest;
use pathwarden_core::archive::ArchiveFormat;
use pathwarden_core::archive::EntryRejection;
use pathwarden_core::archive::inspect::read_entries;
use pathwarden_core::archive::scan::ScanReport;
use pathwarden_core::archive::scan::scan_archive;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

/// Everything found while checking one archive.
#[derive(Debug, Serialize)]
pub struct ArchiveCheckReport {
    pub archive: PathBuf,
    pub target: PathBuf,
    pub format: ArchiveFormat,
    pub entries: usize,
    pub valid: usize,
    pub rejected: Vec<EntryRejection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanReport>,
}

impl ArchiveCheckReport {
    pub fn is_safe(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Runs `path` through the warden so the command honours the configured
/// mode like every other operation.
fn guarded_path(warden: &PathWarden, path: &Path, must_exist: bool) -> Result<PathBuf> {
    let input = path
        .to_str()
        .ok_or_else(|| anyhow!("VALIDATION_ERROR: path is not valid UTF-8\nHINT: Rename the file or directory"))?;
    let real = warden
        .validate(&ValidationRequest::new(input).require_exists(must_exist))
        .map_err(|e| convert_warden_error(&e, warden.mode()))?;
    Ok(real.into_path_buf())
}

/// Exits with failure when any entry is rejected; every offender is
/// reported first.
///
/// Both the archive and the target directory must pass validation in the
/// configured mode before the archive is opened.
pub fn check(
    args: &ArchiveCheckArgs,
    warden: &PathWarden,
    formatter: &dyn OutputFormatter,
    no_progress: bool,
) -> Result<ExitCode> {
    let mut limits = warden.limits().clone();
    if let Some(max) = args.max_file_size {
        limits.max_file_size = limits.max_file_size.min(max);
    }
    if let Some(max) = args.max_total_size {
        limits.max_absolute_bytes = limits.max_absolute_bytes.min(max);
    }

    let archive = guarded_path(warden, &args.archive, true)?;
    let target = guarded_path(warden, &args.target, false)?;

    let listing = read_entries(&archive, &limits).map_err(|e| convert_archive_error(e, &archive))?;
    let outcome = ArchiveValidator::new(limits.clone())
        .validate_entries(&listing.entries, &target)
        .map_err(|e| convert_archive_error(e, &archive))?;

    let scan = if args.deep {
        let progress = (!no_progress && CliProgress::should_show())
            .then(|| CliProgress::new(listing.entries.len(), "Scanning"));
        let report = scan_archive(&archive, &limits, |_, total| {
            if let Some(progress) = &progress {
                progress.on_member(total);
            }
        })
        .map_err(|e| convert_archive_error(e, &archive))?;
        Some(report)
    } else {
        None
    };

    let report = ArchiveCheckReport {
        archive,
        target,
        format: listing.format,
        entries: listing.entries.len(),
        valid: outcome.valid.len(),
        rejected: outcome.invalid_entries,
        scan,
    };
    formatter.format_archive_check(&report)?;

    Ok(if report.is_safe() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
