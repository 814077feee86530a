//! System directory deny-list for unrestricted mode.

use std::path::Path;
use std::path::PathBuf;

use crate::config::SecuritySection;
use crate::path::ExpansionContext;
use crate::path::dedup_roots;
use crate::path::is_contained;
use crate::path::normalize_with;

#[cfg(unix)]
const PLATFORM_DEFAULTS: &[&str] = &[
    "/etc",
    "/bin",
    "/sbin",
    "/usr/bin",
    "/usr/sbin",
    "/usr/lib",
    "/boot",
    "/proc",
    "/sys",
    "/dev",
    "/root",
    "/var/log",
    "/var/run",
    "/System",
    "/Library",
    "/private/etc",
    "/private/var/log",
];

#[cfg(windows)]
const PLATFORM_DEFAULTS: &[&str] = &[
    r"C:\Windows",
    r"C:\Program Files",
    r"C:\Program Files (x86)",
    r"C:\ProgramData",
    r"C:\$Recycle.Bin",
];

#[cfg(not(any(unix, windows)))]
const PLATFORM_DEFAULTS: &[&str] = &[];

/// Directories that stay off-limits even when the whole filesystem is
/// otherwise permitted.
///
/// Each entry is kept both in its lexical form and, when it exists, in its
/// canonical form, so `/etc` still matches on systems where it is a link to
/// `/private/etc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDenyList {
    entries: Vec<PathBuf>,
}

impl SystemDenyList {
    /// The built-in list for the current platform.
    #[must_use]
    pub fn default_for_platform() -> Self {
        Self::from_entries(PLATFORM_DEFAULTS.iter().map(PathBuf::from))
    }

    /// An empty list; nothing is denied.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a list from explicit entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut expanded = Vec::new();
        for entry in entries {
            if let Ok(real) = entry.canonicalize()
                && real != entry
            {
                expanded.push(real);
            }
            expanded.push(entry);
        }
        Self {
            entries: dedup_roots(expanded),
        }
    }

    /// Builds the list described by the `security` section.
    ///
    /// `blacklist_system_paths: false` disables the list. A `system_paths`
    /// array replaces the platform default; entries that do not expand are
    /// skipped with a warning.
    #[must_use]
    pub fn from_config(section: &SecuritySection, base: &Path, ctx: &ExpansionContext) -> Self {
        if !section.blacklist_system_paths {
            return Self::disabled();
        }
        let Some(custom) = &section.system_paths else {
            return Self::default_for_platform();
        };

        let entries = custom.iter().filter_map(|raw| match normalize_with(raw, base, ctx) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(entry = %raw, error = %e, "skipping deny-list entry");
                None
            }
        });
        Self::from_entries(entries)
    }

    /// Returns the deny-list entry containing `path`, if any.
    #[must_use]
    pub fn matching(&self, path: &Path) -> Option<&Path> {
        self.entries
            .iter()
            .find(|denied| is_contained(path, denied))
            .map(PathBuf::as_path)
    }

    /// All entries, including canonical aliases.
    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SystemDenyList {
    fn default() -> Self {
        Self::default_for_platform()
    }
}
