//! The seam between the shared pipeline and a security mode.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use crate::Result;
use crate::config::SecurityMode;
use crate::path::is_contained;
use crate::path::matching_root;

/// The set of directories a mode permits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSet {
    /// An explicit list of roots.
    Roots {
        /// Roots after symlink resolution; containment is decided on these.
        real: Vec<PathBuf>,
        /// Roots as configured, used only to tell a symlink escape apart
        /// from an ordinary out-of-bounds request.
        lexical: Vec<PathBuf>,
    },
    /// Every absolute path on the filesystem.
    Filesystem,
}

impl RootSet {
    /// Builds an explicit root set.
    #[must_use]
    pub const fn roots(real: Vec<PathBuf>, lexical: Vec<PathBuf>) -> Self {
        Self::Roots { real, lexical }
    }

    /// Returns the root containing the real path `real`, if any.
    #[must_use]
    pub fn matching<'a>(&'a self, real: &'a Path) -> Option<&'a Path> {
        match self {
            Self::Roots { real: roots, .. } => matching_root(real, roots),
            Self::Filesystem => {
                let root = real.ancestors().last()?;
                is_contained(real, root).then_some(root)
            }
        }
    }

    /// Returns `true` if the unresolved path `lexical` looks like it is
    /// inside one of the roots.
    #[must_use]
    pub fn lexically_contains(&self, lexical: &Path) -> bool {
        match self {
            Self::Roots { real, lexical: configured } => {
                matching_root(lexical, configured).is_some()
                    || matching_root(lexical, real).is_some()
            }
            Self::Filesystem => lexical.is_absolute(),
        }
    }
}

/// What distinguishes one security mode from another.
///
/// The validation pipeline itself is fixed. A policy only supplies the
/// permitted roots and, optionally, an exclusion list applied after
/// containment.
pub trait ModePolicy: fmt::Debug + Send + Sync {
    /// The mode this policy implements.
    fn mode(&self) -> SecurityMode;

    /// The roots for this call.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Validation` when the configuration cannot serve
    /// any request (for example an empty allow-list).
    fn root_set(&self) -> Result<RootSet>;

    /// Returns the excluded directory containing `real`, if any.
    fn excluded(&self, _real: &Path) -> Option<PathBuf> {
        None
    }
}
