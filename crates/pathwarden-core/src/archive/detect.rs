//! Archive format detection.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::ArchiveError;

/// Archive formats whose entry lists can be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// Tar archive (uncompressed).
    Tar,
    /// Gzip-compressed tar archive.
    TarGz,
    /// Bzip2-compressed tar archive.
    TarBz2,
    /// XZ-compressed tar archive.
    TarXz,
    /// Zstd-compressed tar archive.
    TarZst,
    /// ZIP archive.
    Zip,
}

impl ArchiveFormat {
    /// Short name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        }
    }

    /// Whether members carry a per-entry compressed size.
    #[must_use]
    pub const fn has_member_sizes(self) -> bool {
        matches!(self, Self::Zip)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detects the archive format from the file name.
///
/// # Errors
///
/// Returns [`ArchiveError::UnsupportedFormat`] for unknown extensions.
pub fn detect_format(path: &Path) -> Result<ArchiveFormat, ArchiveError> {
    let unsupported = || ArchiveError::UnsupportedFormat(path.display().to_string());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(unsupported)?
        .to_ascii_lowercase();

    match extension.as_str() {
        "tar" => Ok(ArchiveFormat::Tar),
        "gz" | "tgz" => Ok(ArchiveFormat::TarGz),
        "bz2" | "tbz" | "tbz2" => Ok(ArchiveFormat::TarBz2),
        "xz" | "txz" => Ok(ArchiveFormat::TarXz),
        "zst" | "tzst" => Ok(ArchiveFormat::TarZst),
        "zip" => Ok(ArchiveFormat::Zip),
        _ => Err(unsupported()),
    }
}
