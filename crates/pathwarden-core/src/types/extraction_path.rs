//! Validated archive extraction target.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

/// An absolute path inside an extraction target directory, produced by the
/// archive entry validator.
///
/// Like [`RealPath`](super::RealPath), it can only be obtained through
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafeExtractionPath(PathBuf);

impl SafeExtractionPath {
    pub(crate) fn new_unchecked(path: PathBuf) -> Self {
        Self(path)
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for SafeExtractionPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SafeExtractionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}
