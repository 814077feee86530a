//! Archive-level failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::io::DecompressionLimit;

/// Failures that stop archive processing as a whole.
///
/// Per-entry problems are not errors of this type; they are collected as
/// [`EntryRejection`](super::EntryRejection)s instead.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive lists more entries than the limit allows. Raised before
    /// any entry is examined.
    #[error("archive has {count} entries, more than the limit of {max}")]
    TooManyEntries {
        /// Entries seen (inspection stops one past the limit).
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The archive format could not be determined or is not supported.
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),

    /// The archive headers could not be read.
    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    /// The extraction target cannot be used.
    #[error("invalid extraction target {path}: {message}")]
    InvalidTarget {
        /// The target as supplied.
        path: PathBuf,
        /// What is wrong with it.
        message: String,
    },

    /// Streaming a member crossed a decompression limit.
    #[error("{entry:?}: {limit}")]
    DecompressionLimit {
        /// The member being read when the limit tripped.
        entry: String,
        /// Which limit.
        limit: DecompressionLimit,
    },

    /// I/O failure while reading the archive.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Returns `true` for failures caused by hostile or oversized input
    /// rather than by the environment.
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::TooManyEntries { .. } | Self::DecompressionLimit { .. })
    }
}
