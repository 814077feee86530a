//! Error taxonomy for path validation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using `WardenError`.
pub type Result<T> = std::result::Result<T, WardenError>;

/// Why a well-formed request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// The resolved real path lies outside every permitted root.
    OutsideRoots,
    /// The resolved real path lies inside a deny-listed system directory.
    SystemPath {
        /// The deny-list entry that matched.
        denied_root: PathBuf,
    },
    /// The input lexically lies inside a root but its real path does not.
    SymlinkEscape {
        /// Where the symlink chain actually leads.
        real_path: PathBuf,
    },
    /// The target does not exist and the request required it.
    NotFound,
    /// The target (or its nearest existing ancestor) is not writable.
    NotWritable,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutsideRoots => write!(f, "path is outside the permitted directories"),
            Self::SystemPath { denied_root } => {
                write!(f, "path is inside protected system directory {}", denied_root.display())
            }
            Self::SymlinkEscape { real_path } => {
                write!(f, "symlink resolves outside the permitted directories to {}", real_path.display())
            }
            Self::NotFound => write!(f, "path does not exist"),
            Self::NotWritable => write!(f, "path is not writable"),
        }
    }
}

/// Coarse classification of a [`WardenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed, or the configuration cannot serve it.
    Validation,
    /// The request is well-formed but the trust boundary rejected it.
    AccessDenied,
    /// Reading or writing the configuration failed.
    Persistence,
}

/// Errors produced by the validation core.
#[derive(Error, Debug)]
pub enum WardenError {
    /// The request is malformed or the configuration cannot serve it.
    #[error("validation error: {message}")]
    Validation {
        /// Short description of what is wrong.
        message: String,
        /// Optional extra detail for diagnostics.
        details: Option<String>,
    },

    /// The request is well-formed but falls outside the trust boundary.
    #[error("access denied: {requested_path}: {reason}")]
    AccessDenied {
        /// The path exactly as the caller supplied it.
        requested_path: String,
        /// Why access was denied.
        reason: DenialReason,
    },

    /// I/O failure while reading or writing configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document could not be parsed or serialized.
    #[error("invalid configuration {path}: {message}")]
    Config {
        /// The configuration file involved.
        path: PathBuf,
        /// Parser or serializer message.
        message: String,
    },
}

impl WardenError {
    /// Builds a `Validation` error without details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Builds a `Validation` error carrying details.
    pub fn validation_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Builds an `AccessDenied` error.
    pub fn access_denied(requested_path: impl Into<String>, reason: DenialReason) -> Self {
        Self::AccessDenied {
            requested_path: requested_path.into(),
            reason,
        }
    }

    /// Returns the coarse classification of this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathwarden_core::error::{DenialReason, ErrorKind, WardenError};
    ///
    /// let err = WardenError::access_denied("/etc/shadow", DenialReason::OutsideRoots);
    /// assert_eq!(err.kind(), ErrorKind::AccessDenied);
    ///
    /// let err = WardenError::validation("path is empty");
    /// assert_eq!(err.kind(), ErrorKind::Validation);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Io(_) | Self::Config { .. } => ErrorKind::Persistence,
        }
    }

    /// Returns `true` if the trust boundary rejected the request.
    ///
    /// An access denial is the boundary working as intended and must not be
    /// "fixed" by relaxing a check.
    #[must_use]
    pub const fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// Returns `true` if the request or configuration is malformed.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns the denial reason, if this is an access denial.
    #[must_use]
    pub const fn denial_reason(&self) -> Option<&DenialReason> {
        match self {
            Self::AccessDenied { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
