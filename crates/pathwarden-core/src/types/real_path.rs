//! Validated real-path type.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

/// An absolute, symlink-resolved path proven to lie inside the active trust
/// boundary.
///
/// # Security Properties
///
/// - Can ONLY be constructed by the validator pipeline
/// - NO `From<PathBuf>` implementation
/// - Carries no guarantee that the filesystem entry is unchanged after
///   validation; open it with [`open_no_follow`](crate::path::open_no_follow)
///   to keep the check and the use as close as the platform allows
///
/// # Examples
///
/// ```no_run
/// use pathwarden_core::{PathWarden, ValidationRequest};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let warden = PathWarden::load_default()?;
/// let real = warden.validate(&ValidationRequest::new("./notes.txt"))?;
/// println!("{}", real.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RealPath {
    path: PathBuf,
    exists: bool,
}

impl RealPath {
    pub(crate) fn new_unchecked(path: PathBuf, exists: bool) -> Self {
        Self { path, exists }
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Whether the target existed at validation time.
    #[inline]
    #[must_use]
    pub fn existed(&self) -> bool {
        self.exists
    }

    /// Converts into the inner `PathBuf`.
    #[inline]
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for RealPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for RealPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.display().fmt(f)
    }
}
