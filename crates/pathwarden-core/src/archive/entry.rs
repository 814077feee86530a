//! Archive entry metadata and rejection reasons.

use std::fmt;

use serde::Serialize;

/// What an archive member will become on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// A regular file.
    #[default]
    File,
    /// A directory.
    Directory,
    /// A symbolic link; the target is relative to the link's directory.
    Symlink,
    /// A hard link; the target is relative to the archive root.
    Hardlink,
    /// Anything else (devices, FIFOs). Never written by extractors.
    Other,
}

impl EntryKind {
    /// Returns `true` for symbolic and hard links.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, Self::Symlink | Self::Hardlink)
    }
}

/// One member of an archive, as reported by its headers.
///
/// Everything here is untrusted: names may be hostile, sizes may lie and
/// link targets may point anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// Member name exactly as stored.
    pub name: String,
    /// Declared uncompressed size in bytes.
    pub declared_size: u64,
    /// Declared compressed size, when the format records one per member.
    pub compressed_size: Option<u64>,
    /// Member type.
    pub kind: EntryKind,
    /// Link target exactly as stored, for link entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
}

impl ArchiveEntry {
    /// A regular file with a declared size and no compressed size.
    #[must_use]
    pub fn new(name: impl Into<String>, declared_size: u64) -> Self {
        Self {
            name: name.into(),
            declared_size,
            compressed_size: None,
            kind: EntryKind::File,
            link_target: None,
        }
    }

    /// A directory entry.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Directory,
            ..Self::new(name, 0)
        }
    }

    /// A symbolic link pointing at `target`.
    #[must_use]
    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::link(EntryKind::Symlink, name, target)
    }

    /// A hard link to the member named `target`.
    #[must_use]
    pub fn hardlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::link(EntryKind::Hardlink, name, target)
    }

    fn link(kind: EntryKind, name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            link_target: Some(target.into()),
            ..Self::new(name, 0)
        }
    }

    /// Sets the member type.
    #[must_use]
    pub const fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches a declared compressed size.
    #[must_use]
    pub const fn with_compressed_size(mut self, compressed: u64) -> Self {
        self.compressed_size = Some(compressed);
        self
    }
}

/// Why an entry may not be extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The name is empty or consists only of separators and `.`.
    EmptyName,
    /// The name matched a blocked pattern.
    BlockedPattern {
        /// Rule name from the pattern table.
        pattern: &'static str,
    },
    /// The name is longer than the path length limit.
    PathTooLong {
        /// Name length in bytes.
        length: usize,
        /// Configured maximum.
        max: usize,
    },
    /// One component is longer than the component length limit.
    ComponentTooLong {
        /// Component length in bytes.
        length: usize,
        /// Configured maximum.
        max: usize,
    },
    /// The name nests deeper than the depth limit.
    TooDeep {
        /// Number of components.
        depth: usize,
        /// Configured maximum.
        max: usize,
    },
    /// The extraction path falls outside the target directory.
    EscapesTarget,
    /// The name contains a NUL byte.
    NulByte,
    /// The basename is a reserved device name.
    ReservedName {
        /// The device the name refers to.
        device: &'static str,
    },
    /// The declared size exceeds the per-file limit.
    EntryTooLarge {
        /// Declared size in bytes.
        size: u64,
        /// Configured maximum.
        max: u64,
    },
    /// Accepting the entry would push the declared total past the limit.
    AggregateSizeExceeded {
        /// Running total including this entry.
        total: u64,
        /// Configured maximum.
        max: u64,
    },
    /// Declared sizes imply a compression ratio above the limit.
    CompressionRatio {
        /// Declared uncompressed / compressed.
        ratio: f64,
        /// Configured maximum.
        max: f64,
    },
    /// A link entry has no target, an absolute target, or a target that
    /// resolves outside the target directory.
    LinkEscapesTarget {
        /// The link target as stored.
        link_target: String,
    },
    /// The entry would be written through an earlier link entry.
    ThroughLink {
        /// Name of the link entry on the path.
        link: String,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "empty entry name"),
            Self::BlockedPattern { pattern } => write!(f, "name matches blocked pattern {pattern}"),
            Self::PathTooLong { length, max } => {
                write!(f, "name is {length} bytes, limit is {max}")
            }
            Self::ComponentTooLong { length, max } => {
                write!(f, "path component is {length} bytes, limit is {max}")
            }
            Self::TooDeep { depth, max } => write!(f, "nesting depth {depth} exceeds {max}"),
            Self::EscapesTarget => write!(f, "extraction path escapes the target directory"),
            Self::NulByte => write!(f, "name contains a NUL byte"),
            Self::ReservedName { device } => write!(f, "name refers to reserved device {device}"),
            Self::EntryTooLarge { size, max } => {
                write!(f, "declared size {size} exceeds per-file limit {max}")
            }
            Self::AggregateSizeExceeded { total, max } => {
                write!(f, "declared total {total} exceeds limit {max}")
            }
            Self::CompressionRatio { ratio, max } => {
                write!(f, "compression ratio {ratio:.1} exceeds {max:.1}")
            }
            Self::LinkEscapesTarget { link_target } => {
                write!(f, "link target {link_target:?} escapes the target directory")
            }
            Self::ThroughLink { link } => write!(f, "path passes through link entry {link:?}"),
        }
    }
}

/// A rejected entry, collected so every offender can be reported at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryRejection {
    /// The entry name as stored in the archive.
    pub entry: String,
    /// Why it was rejected.
    pub reason: RejectionReason,
}

impl fmt::Display for EntryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.entry, self.reason)
    }
}

impl std::error::Error for EntryRejection {}
