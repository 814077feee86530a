//! Streaming every member through the decompression limits.
//!
//! This is what an extracting caller would do, minus the writes: each byte
//! is decompressed in bounded reads and discarded, so a decompression bomb
//! is caught by its actual output rather than by what its headers claim.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;

use serde::Serialize;

use super::ArchiveError;
use super::detect::ArchiveFormat;
use super::detect::detect_format;
use super::inspect::open_tar;
use super::inspect::tar_failure;
use crate::io::BoundedReader;
use crate::io::CompressedSize;
use crate::io::DecompressionLimit;
use crate::limits::SecurityLimits;

/// Totals from a completed scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Detected format.
    pub format: ArchiveFormat,
    /// Members streamed.
    pub members: usize,
    /// Decompressed bytes produced.
    pub uncompressed_bytes: u64,
    /// Compressed bytes consumed.
    pub compressed_bytes: u64,
}

/// Decompresses every member of the archive at `path` under `limits`.
///
/// `on_member` is called after each member with its name and the running
/// decompressed total.
///
/// # Errors
///
/// - [`ArchiveError::DecompressionLimit`] naming the member being read when
///   a limit tripped
/// - [`ArchiveError::TooManyEntries`] past `max_entries` members
/// - [`ArchiveError::InvalidArchive`] / [`ArchiveError::Io`] for unreadable
///   input
pub fn scan_archive(
    path: &Path,
    limits: &SecurityLimits,
    mut on_member: impl FnMut(&str, u64),
) -> Result<ScanReport, ArchiveError> {
    let format = detect_format(path)?;
    let report = match format {
        ArchiveFormat::Zip => scan_zip(path, limits, &mut on_member)?,
        _ => scan_tar(path, format, limits, &mut on_member)?,
    };

    tracing::debug!(
        archive = %path.display(),
        members = report.members,
        uncompressed = report.uncompressed_bytes,
        compressed = report.compressed_bytes,
        "archive scanned"
    );
    Ok(report)
}

fn scan_tar(
    path: &Path,
    format: ArchiveFormat,
    limits: &SecurityLimits,
    on_member: &mut impl FnMut(&str, u64),
) -> Result<ScanReport, ArchiveError> {
    let mut archive = open_tar(path, format, limits)?;
    let mut members = 0usize;
    let mut streamed = 0u64;
    let mut current = String::new();
    let mut too_many = false;

    let walked: io::Result<()> = (|| {
        for item in archive.entries()? {
            if members >= limits.max_entries {
                too_many = true;
                break;
            }
            let mut entry = item?;
            current = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            streamed = streamed.saturating_add(io::copy(&mut entry, &mut io::sink())?);
            members += 1;
            on_member(&current, streamed);
        }
        Ok(())
    })();

    let bounded = archive.into_inner();
    if let Err(e) = walked {
        return Err(tar_failure(&e, &current, bounded.tripped()));
    }
    if too_many {
        return Err(ArchiveError::TooManyEntries {
            count: members + 1,
            max: limits.max_entries,
        });
    }

    Ok(ScanReport {
        format,
        members,
        uncompressed_bytes: bounded.total_uncompressed(),
        compressed_bytes: bounded.total_compressed(),
    })
}

fn scan_zip(
    path: &Path,
    limits: &SecurityLimits,
    on_member: &mut impl FnMut(&str, u64),
) -> Result<ScanReport, ArchiveError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| ArchiveError::InvalidArchive(format!("failed to open ZIP archive: {e}")))?;

    if archive.len() > limits.max_entries {
        return Err(ArchiveError::TooManyEntries {
            count: archive.len(),
            max: limits.max_entries,
        });
    }

    let mut uncompressed = 0u64;
    let mut compressed = 0u64;

    for i in 0..archive.len() {
        let member = archive
            .by_index(i)
            .map_err(|e| ArchiveError::InvalidArchive(format!("failed to read ZIP entry: {e}")))?;
        let name = String::from_utf8_lossy(member.name_raw()).into_owned();
        compressed = compressed.saturating_add(member.compressed_size());

        let mut bounded = BoundedReader::new(member, CompressedSize::Declared(compressed), limits)
            .with_running_total(uncompressed);
        if let Err(e) = io::copy(&mut bounded, &mut io::sink()) {
            return Err(match DecompressionLimit::from_io(&e) {
                Some(limit) => ArchiveError::DecompressionLimit {
                    entry: name,
                    limit: limit.clone(),
                },
                None => ArchiveError::InvalidArchive(format!("failed to read ZIP entry {name:?}: {e}")),
            });
        }
        uncompressed = bounded.total_uncompressed();
        on_member(&name, uncompressed);
    }

    Ok(ScanReport {
        format: ArchiveFormat::Zip,
        members: archive.len(),
        uncompressed_bytes: uncompressed,
        compressed_bytes: compressed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_tar;
    use crate::test_utils::create_test_tar_gz;
    use crate::test_utils::create_deflated_zip;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_plain_tar() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("a.tar");
        fs::write(&path, create_test_tar(vec![("a.txt", b"hello"), ("b.txt", b"world")])).unwrap();

        let mut seen = Vec::new();
        let report = scan_archive(&path, &SecurityLimits::default(), |name, _| seen.push(name.to_string())).unwrap();
        assert_eq!(report.members, 2);
        assert_eq!(seen, ["a.txt", "b.txt"]);
    }

    #[test]
    fn test_scan_gzip_bomb() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("bomb.tar.gz");
        let zeros = vec![0u8; 8 * 1024 * 1024];
        fs::write(&path, create_test_tar_gz(vec![("zeros.bin", zeros.as_slice())])).unwrap();

        let err = scan_archive(&path, &SecurityLimits::default(), |_, _| {}).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::DecompressionLimit {
                limit: DecompressionLimit::Ratio { .. },
                ..
            }
        ));
        assert!(err.is_security_violation());
    }

    #[test]
    fn test_scan_zip_bomb() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("bomb.zip");
        let zeros = vec![0u8; 8 * 1024 * 1024];
        fs::write(&path, create_deflated_zip(vec![("zeros.bin", zeros.as_slice())])).unwrap();

        let err = scan_archive(&path, &SecurityLimits::default(), |_, _| {}).unwrap_err();
        match err {
            ArchiveError::DecompressionLimit { entry, .. } => assert_eq!(entry, "zeros.bin"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_scan_total_cap() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("big.tar");
        let data = vec![7u8; 200_000];
        fs::write(&path, create_test_tar(vec![("big.bin", data.as_slice())])).unwrap();

        let limits = SecurityLimits {
            max_absolute_bytes: 100_000,
            ..SecurityLimits::default()
        };
        let err = scan_archive(&path, &limits, |_, _| {}).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::DecompressionLimit {
                limit: DecompressionLimit::TotalBytes { max: 100_000 },
                ..
            }
        ));
    }
}
