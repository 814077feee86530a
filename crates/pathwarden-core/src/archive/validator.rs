//! Zip-slip and decompression-bomb checks for archive entries.

use std::path::Path;
use std::path::PathBuf;

use super::ArchiveEntry;
use super::ArchiveError;
use super::EntryKind;
use super::EntryRejection;
use super::RejectionReason;
use super::patterns::first_blocked;
use super::reserved::reserved_device;
use crate::limits::SecurityLimits;
use crate::path::is_contained;
use crate::path::lexical_clean;
use crate::path::resolve_real;
use crate::types::SafeExtractionPath;

/// An entry that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedEntry {
    /// The entry as read from the archive.
    pub entry: ArchiveEntry,
    /// Where it may be written.
    pub path: SafeExtractionPath,
}

/// Result of validating a whole entry list.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Entries that may be extracted, in archive order.
    pub valid: Vec<ValidatedEntry>,
    /// Every rejected entry, in archive order.
    pub invalid_entries: Vec<EntryRejection>,
}

impl BatchOutcome {
    /// Returns `true` if no entry was rejected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid_entries.is_empty()
    }
}

/// Validates archive entry names and declared sizes against a target
/// directory.
///
/// Name checks run in a fixed order and the first failing check names the
/// rejection:
///
/// 1. blocked patterns (absolute paths, drive prefixes, `..`, leading
///    separators, system directories)
/// 2. path length, component length and depth
/// 3. containment of `target + name` in `target`
/// 4. NUL bytes
/// 5. reserved device names (when enabled)
///
/// # Examples
///
/// ```
/// use pathwarden_core::archive::ArchiveValidator;
/// use std::path::Path;
///
/// let validator = ArchiveValidator::default();
/// let target = Path::new("/safe/target");
///
/// assert!(validator.validate_entry("../../etc/passwd", target).is_err());
/// let path = validator.validate_entry("docs/readme.txt", target).unwrap();
/// assert_eq!(path.as_path(), Path::new("/safe/target/docs/readme.txt"));
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveValidator {
    limits: SecurityLimits,
    check_reserved_names: bool,
}

impl Default for ArchiveValidator {
    fn default() -> Self {
        Self::new(SecurityLimits::default())
    }
}

impl ArchiveValidator {
    /// Creates a validator. Reserved device names are checked on Windows
    /// only.
    #[must_use]
    pub fn new(limits: SecurityLimits) -> Self {
        Self {
            limits,
            check_reserved_names: cfg!(windows),
        }
    }

    /// Overrides the reserved device name check.
    #[must_use]
    pub fn with_reserved_names(mut self, enabled: bool) -> Self {
        self.check_reserved_names = enabled;
        self
    }

    /// The limits in force.
    #[must_use]
    pub const fn limits(&self) -> &SecurityLimits {
        &self.limits
    }

    /// Validates a single entry name against `target`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as an [`EntryRejection`].
    pub fn validate_entry(&self, name: &str, target: &Path) -> Result<SafeExtractionPath, EntryRejection> {
        let target = resolve_target(target);
        self.check_name(name, &target).map_err(|reason| self.reject(name, reason))
    }

    /// Validates every entry, collecting all rejections.
    ///
    /// The entry-count ceiling is checked first and short-circuits; nothing
    /// else is computed for an oversized list. After the name checks:
    ///
    /// - an entry at or beneath an earlier link entry is rejected, since an
    ///   extractor would write through the link
    /// - a link target must be relative and, walked component by component
    ///   from the link's directory (symlinks) or the target root
    ///   (hardlinks), must stay inside the target without passing through
    ///   an earlier link
    /// - declared sizes: a single entry over `max_file_size`, a declared
    ///   compression ratio over the limit, or the entry that pushes the
    ///   running total of accepted entries past `max_absolute_bytes`
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::TooManyEntries`] if `entries` is longer than
    /// `max_entries`.
    pub fn validate_entries(&self, entries: &[ArchiveEntry], target: &Path) -> Result<BatchOutcome, ArchiveError> {
        if entries.len() > self.limits.max_entries {
            tracing::warn!(
                security_event = "archive_entry_limit",
                count = entries.len(),
                max = self.limits.max_entries,
                "archive rejected"
            );
            return Err(ArchiveError::TooManyEntries {
                count: entries.len(),
                max: self.limits.max_entries,
            });
        }

        let target = resolve_target(target);
        let mut outcome = BatchOutcome::default();
        let mut declared_total: u64 = 0;
        let mut links = LinkPaths::default();

        for entry in entries {
            let checked = self.check_entry(entry, &target, &mut links, declared_total);

            match checked {
                Ok((path, total)) => {
                    declared_total = total;
                    outcome.valid.push(ValidatedEntry {
                        entry: entry.clone(),
                        path,
                    });
                }
                Err(reason) => outcome.invalid_entries.push(self.reject(&entry.name, reason)),
            }
        }

        tracing::debug!(
            valid = outcome.valid.len(),
            rejected = outcome.invalid_entries.len(),
            declared_total,
            "archive entries validated"
        );
        Ok(outcome)
    }

    fn check_entry(
        &self,
        entry: &ArchiveEntry,
        target: &Path,
        links: &mut LinkPaths,
        declared_total: u64,
    ) -> Result<(SafeExtractionPath, u64), RejectionReason> {
        let path = self.check_name(&entry.name, target)?;
        if let Some(link) = links.covering(path.as_path()) {
            return Err(RejectionReason::ThroughLink { link: link.to_string() });
        }

        if entry.kind.is_link() {
            // Recorded even when the target is rejected: an extractor that
            // ignores the rejection must not be trusted with later entries.
            let verdict = self.check_link_target(entry, path.as_path(), target, links);
            links.push(path.as_path().to_path_buf(), &entry.name);
            verdict?;
        }

        let total = self.check_sizes(entry, declared_total)?;
        Ok((path, total))
    }

    fn check_link_target(
        &self,
        entry: &ArchiveEntry,
        link_path: &Path,
        target: &Path,
        links: &LinkPaths,
    ) -> Result<(), RejectionReason> {
        let raw = entry.link_target.as_deref().unwrap_or_default();
        let escapes = || RejectionReason::LinkEscapesTarget {
            link_target: raw.to_string(),
        };

        if raw.len() > self.limits.max_path_length {
            return Err(RejectionReason::PathTooLong {
                length: raw.len(),
                max: self.limits.max_path_length,
            });
        }
        if raw.is_empty() || raw.contains('\0') || is_rooted(raw) {
            return Err(escapes());
        }

        let mut current = match entry.kind {
            EntryKind::Symlink => link_path.parent().unwrap_or(target).to_path_buf(),
            _ => target.to_path_buf(),
        };
        for component in raw.split(['/', '\\']) {
            match component {
                "" | "." => continue,
                ".." => {
                    current.pop();
                }
                name => current.push(name),
            }
            if !is_contained(&current, target) {
                return Err(escapes());
            }
            if let Some(link) = links.covering(&current) {
                return Err(RejectionReason::ThroughLink { link: link.to_string() });
            }
        }

        if entry.kind == EntryKind::Hardlink && current == target {
            return Err(escapes());
        }
        Ok(())
    }

    fn check_name(&self, name: &str, target: &Path) -> Result<SafeExtractionPath, RejectionReason> {
        if let Some(pattern) = first_blocked(name) {
            return Err(RejectionReason::BlockedPattern { pattern });
        }

        if name.len() > self.limits.max_path_length {
            return Err(RejectionReason::PathTooLong {
                length: name.len(),
                max: self.limits.max_path_length,
            });
        }

        let components = sanitized_components(name);
        if components.is_empty() {
            return Err(RejectionReason::EmptyName);
        }
        if let Some(long) = components
            .iter()
            .find(|c| c.len() > self.limits.max_component_length)
        {
            return Err(RejectionReason::ComponentTooLong {
                length: long.len(),
                max: self.limits.max_component_length,
            });
        }
        if components.len() > self.limits.max_entry_depth {
            return Err(RejectionReason::TooDeep {
                depth: components.len(),
                max: self.limits.max_entry_depth,
            });
        }

        let joined = components
            .iter()
            .fold(target.to_path_buf(), |acc, c| acc.join(c));
        let candidate = lexical_clean(&joined);
        if candidate == target || !is_contained(&candidate, target) {
            return Err(RejectionReason::EscapesTarget);
        }

        if name.contains('\0') {
            return Err(RejectionReason::NulByte);
        }

        if self.check_reserved_names
            && let Some(basename) = components.last()
            && let Some(device) = reserved_device(basename)
        {
            return Err(RejectionReason::ReservedName { device });
        }

        Ok(SafeExtractionPath::new_unchecked(candidate))
    }

    /// Returns the new running total if the entry's declared sizes are
    /// acceptable.
    fn check_sizes(&self, entry: &ArchiveEntry, declared_total: u64) -> Result<u64, RejectionReason> {
        if entry.declared_size > self.limits.max_file_size {
            return Err(RejectionReason::EntryTooLarge {
                size: entry.declared_size,
                max: self.limits.max_file_size,
            });
        }

        if let Some(compressed) = entry.compressed_size
            && compressed > 0
        {
            let ratio = entry.declared_size as f64 / compressed as f64;
            if ratio > self.limits.max_compression_ratio {
                return Err(RejectionReason::CompressionRatio {
                    ratio,
                    max: self.limits.max_compression_ratio,
                });
            }
        }

        let total = declared_total.saturating_add(entry.declared_size);
        if total > self.limits.max_absolute_bytes {
            return Err(RejectionReason::AggregateSizeExceeded {
                total,
                max: self.limits.max_absolute_bytes,
            });
        }
        Ok(total)
    }

    fn reject(&self, name: &str, reason: RejectionReason) -> EntryRejection {
        tracing::warn!(
            security_event = "archive_entry_blocked",
            entry = name,
            reason = %reason,
            "archive entry rejected"
        );
        EntryRejection {
            entry: name.to_string(),
            reason,
        }
    }
}

/// Extraction paths of the link entries seen so far, with their names.
#[derive(Debug, Default)]
struct LinkPaths(Vec<(PathBuf, String)>);

impl LinkPaths {
    fn push(&mut self, path: PathBuf, name: &str) {
        self.0.push((path, name.to_string()));
    }

    /// Name of the link entry at or above `path`, if any.
    fn covering(&self, path: &Path) -> Option<&str> {
        self.0
            .iter()
            .find(|(link, _)| is_contained(path, link))
            .map(|(_, name)| name.as_str())
    }
}

/// Returns `true` for link targets that name an absolute location:
/// a leading separator or a drive prefix.
fn is_rooted(target: &str) -> bool {
    let bytes = target.as_bytes();
    target.starts_with(['/', '\\'])
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Splits an entry name on either separator, dropping empty and `.`
/// components.
fn sanitized_components(name: &str) -> Vec<&str> {
    name.split(['/', '\\'])
        .filter(|c| !c.is_empty() && *c != ".")
        .collect()
}

/// Makes `target` absolute and resolves symlinks so containment compares
/// real locations.
fn resolve_target(target: &Path) -> PathBuf {
    let absolute = std::path::absolute(target).unwrap_or_else(|_| target.to_path_buf());
    resolve_real(&absolute).map_or_else(|_| lexical_clean(&absolute), |r| r.real_path)
}
