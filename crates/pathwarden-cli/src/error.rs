//! Error conversion utilities for CLI.
//!
//! Converts pathwarden-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance. Path text in
//! validation errors is sanitized the same way a tool handler would
//! sanitize it.

use anyhow::anyhow;
use pathwarden_core::SecurityMode;
use pathwarden_core::WardenError;
use pathwarden_core::archive::ArchiveError;
use pathwarden_core::io::DecompressionLimit;
use std::path::Path;

/// Converts `WardenError` to an anyhow error carrying the sanitized
/// description and a `HINT:` line for `mode`.
pub fn convert_warden_error(err: &WardenError, mode: SecurityMode) -> anyhow::Error {
    let message = err.to_user_message(mode);
    match message.guidance {
        Some(guidance) => anyhow!("{}: {}\nHINT: {guidance}", message.code, message.description),
        None => anyhow!("{}: {}", message.code, message.description),
    }
}

/// Converts `ArchiveError` to a user-friendly anyhow error with context.
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    match err {
        ArchiveError::TooManyEntries { count, max } => {
            anyhow!(
                "Security violation: Archive '{}' has {count} entries (limit {max})\n\
                 HINT: Archives this large are refused outright; split the archive if it is legitimate.",
                archive.display()
            )
        }
        ArchiveError::DecompressionLimit {
            entry,
            limit: DecompressionLimit::Ratio { ratio, max },
        } => {
            anyhow!(
                "Security violation: Archive '{}' appears to be a decompression bomb\n\
                 Entry '{entry}' expanded at {ratio:.0}:1 (limit {max:.0}:1)\n\
                 HINT: Do not extract this archive.",
                archive.display()
            )
        }
        ArchiveError::DecompressionLimit {
            entry,
            limit: DecompressionLimit::TotalBytes { max },
        } => {
            anyhow!(
                "Security violation: Archive '{}' decompresses past {max} bytes at entry '{entry}'\n\
                 HINT: Use --max-total-size only to lower the limit; it cannot be raised.",
                archive.display()
            )
        }
        ArchiveError::UnsupportedFormat(reason) => {
            anyhow!(
                "Archive format not supported: {} ({reason})\n\
                 HINT: Supported formats: tar, tar.gz, tar.bz2, tar.xz, tar.zst, zip",
                archive.display()
            )
        }
        ArchiveError::InvalidArchive(reason) => {
            anyhow!(
                "Invalid archive '{}': {reason}\n\
                 HINT: The archive may be corrupted or malformed.",
                archive.display()
            )
        }
        ArchiveError::InvalidTarget { path, message } => {
            anyhow!(
                "Invalid target directory '{}': {message}\n\
                 HINT: Create the target directory first.",
                path.display()
            )
        }
        ArchiveError::Io(io_err) => {
            anyhow!("I/O error while processing '{}': {io_err}", archive.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathwarden_core::DenialReason;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_convert_denial_is_sanitized_with_hint() {
        let err = WardenError::access_denied("/home/u/other/file.txt", DenialReason::OutsideRoots);
        let msg = format!("{}", convert_warden_error(&err, SecurityMode::Sandboxed));
        assert!(msg.starts_with("ACCESS_DENIED"));
        assert!(msg.contains("HINT"));
        assert!(!msg.contains("/home/u"));
    }

    #[test]
    fn test_convert_io_error_has_no_hint() {
        let err = WardenError::Io(io::Error::other("disk full"));
        let msg = format!("{}", convert_warden_error(&err, SecurityMode::Strict));
        assert!(msg.starts_with("IO_ERROR"));
        assert!(!msg.contains("HINT"));
    }

    #[test]
    fn test_convert_decompression_bomb() {
        let err = ArchiveError::DecompressionLimit {
            entry: "zeros.bin".into(),
            limit: DecompressionLimit::Ratio { ratio: 1024.0, max: 100.0 },
        };
        let msg = format!("{:?}", convert_archive_error(err, Path::new("bomb.zip")));
        assert!(msg.contains("decompression bomb"));
        assert!(msg.contains("1024:1"));
        assert!(msg.contains("bomb.zip"));
    }

    #[test]
    fn test_convert_invalid_target() {
        let err = ArchiveError::InvalidTarget {
            path: PathBuf::from("missing"),
            message: "does not exist".into(),
        };
        let msg = format!("{:?}", convert_archive_error(err, Path::new("a.tar")));
        assert!(msg.contains("Invalid target directory"));
    }
}
