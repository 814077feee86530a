//! Process-wide security limits.

use serde::Serialize;

use crate::config::LimitsSection;

/// Maximum ratio of uncompressed to compressed bytes.
pub const MAX_COMPRESSION_RATIO: f64 = 100.0;

/// Maximum cumulative decompressed bytes for one archive (10 GiB).
pub const MAX_ABSOLUTE_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Maximum number of entries in one archive.
pub const MAX_ENTRIES: usize = 100_000;

/// Maximum size of a single file (1 GiB).
pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

/// Maximum length of a path, in bytes.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Maximum length of a single path component, in bytes.
pub const MAX_COMPONENT_LENGTH: usize = 255;

/// Maximum number of components in an archive entry name.
pub const MAX_ENTRY_DEPTH: usize = 64;

/// Read size used by bounded decompression (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Static security limits.
///
/// Built once at startup and shared read-only. Configuration may tighten a
/// limit but never loosen it past the core constant.
///
/// # Examples
///
/// ```
/// use pathwarden_core::config::LimitsSection;
/// use pathwarden_core::limits::{MAX_FILE_SIZE, SecurityLimits};
///
/// let mut section = LimitsSection::default();
/// section.max_file_size = Some(1024);
/// assert_eq!(SecurityLimits::default().with_overrides(&section).max_file_size, 1024);
///
/// section.max_file_size = Some(u64::MAX);
/// assert_eq!(SecurityLimits::default().with_overrides(&section).max_file_size, MAX_FILE_SIZE);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityLimits {
    /// Maximum uncompressed:compressed ratio.
    pub max_compression_ratio: f64,
    /// Maximum cumulative decompressed bytes.
    pub max_absolute_bytes: u64,
    /// Maximum entries per archive.
    pub max_entries: usize,
    /// Maximum size of one file.
    pub max_file_size: u64,
    /// Maximum path length in bytes.
    pub max_path_length: usize,
    /// Maximum path component length in bytes.
    pub max_component_length: usize,
    /// Maximum archive entry depth.
    pub max_entry_depth: usize,
    /// Decompression chunk size.
    pub chunk_size: usize,
}

impl Default for SecurityLimits {
    fn default() -> Self {
        Self {
            max_compression_ratio: MAX_COMPRESSION_RATIO,
            max_absolute_bytes: MAX_ABSOLUTE_BYTES,
            max_entries: MAX_ENTRIES,
            max_file_size: MAX_FILE_SIZE,
            max_path_length: MAX_PATH_LENGTH,
            max_component_length: MAX_COMPONENT_LENGTH,
            max_entry_depth: MAX_ENTRY_DEPTH,
            chunk_size: CHUNK_SIZE,
        }
    }
}

impl SecurityLimits {
    /// Applies the configured `limits` section as hard caps.
    ///
    /// Each overlapping value becomes `min(current, configured)`.
    #[must_use]
    pub fn with_overrides(mut self, section: &LimitsSection) -> Self {
        if let Some(size) = section.max_file_size {
            self.max_file_size = self.max_file_size.min(size);
        }
        if let Some(count) = section.max_files_per_operation {
            self.max_entries = self.max_entries.min(count);
        }
        if let Some(depth) = section.max_directory_depth {
            self.max_entry_depth = self.max_entry_depth.min(depth);
        }
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let limits = SecurityLimits::default();
        assert_eq!(limits.max_entries, MAX_ENTRIES);
        assert_eq!(limits.max_absolute_bytes, MAX_ABSOLUTE_BYTES);
        assert_eq!(limits.chunk_size, CHUNK_SIZE);
        assert!((limits.max_compression_ratio - MAX_COMPRESSION_RATIO).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overrides_only_tighten() {
        let section: LimitsSection = serde_json::from_str(&format!(
            r#"{{"max_file_size": 10, "max_files_per_operation": {}, "max_directory_depth": 3}}"#,
            usize::MAX
        ))
        .unwrap();
        let limits = SecurityLimits::default().with_overrides(&section);
        assert_eq!(limits.max_file_size, 10);
        assert_eq!(limits.max_entries, MAX_ENTRIES);
        assert_eq!(limits.max_entry_depth, 3);
    }

    #[test]
    fn test_empty_overrides_are_noop() {
        let limits = SecurityLimits::default().with_overrides(&LimitsSection::default());
        assert_eq!(limits, SecurityLimits::default());
    }
}
