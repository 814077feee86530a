//! User-facing error messages.
//!
//! Tool handlers convert every [`WardenError`] into a [`UserMessage`] before
//! anything reaches the protocol layer. Path-valued fields are replaced
//! outright, free text is scrubbed with [`sanitize`], and the guidance line
//! depends on the active security mode.

use serde::Serialize;

use super::sanitize::PATH_PLACEHOLDER;
use super::sanitize::sanitize;
use super::types::DenialReason;
use super::types::WardenError;
use crate::config::SecurityMode;

/// Structured, sanitized error text for external clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserMessage {
    /// Stable error code (e.g. `ACCESS_DENIED`).
    pub code: &'static str,

    /// Sanitized description of what went wrong.
    pub description: String,

    /// What the user can do about it, if anything.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance: Option<String>,
}

impl WardenError {
    /// Returns the stable error code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::AccessDenied { .. } => "ACCESS_DENIED",
            Self::Io(_) => "IO_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Converts the error into sanitized, mode-aware text.
    ///
    /// # Examples
    ///
    /// ```
    /// use pathwarden_core::config::SecurityMode;
    /// use pathwarden_core::error::{DenialReason, WardenError};
    ///
    /// let err = WardenError::access_denied("/home/u/other/file.txt", DenialReason::OutsideRoots);
    /// let msg = err.to_user_message(SecurityMode::Strict);
    /// assert_eq!(msg.code, "ACCESS_DENIED");
    /// assert!(!msg.description.contains("/home/u"));
    /// assert!(msg.guidance.unwrap().contains("working directory"));
    /// ```
    #[must_use]
    pub fn to_user_message(&self, mode: SecurityMode) -> UserMessage {
        UserMessage {
            code: self.code(),
            description: self.public_description(),
            guidance: self.guidance(mode).map(str::to_owned),
        }
    }

    // The regex scrubber cannot tell where a path containing spaces ends,
    // so fields known to hold paths never reach it.
    fn public_description(&self) -> String {
        match self {
            Self::AccessDenied { reason, .. } => {
                format!("access denied: {PATH_PLACEHOLDER}: {}", public_reason(reason))
            }
            Self::Config { message, .. } => {
                format!("invalid configuration {PATH_PLACEHOLDER}: {}", sanitize(message))
            }
            Self::Validation { .. } | Self::Io(_) => sanitize(&self.to_string()),
        }
    }

    fn guidance(&self, mode: SecurityMode) -> Option<&'static str> {
        match self {
            Self::AccessDenied { reason, .. } => Some(denial_guidance(reason, mode)),
            Self::Validation { .. } if mode == SecurityMode::Sandboxed => Some(
                "Check the path for typos. If no directories are allowed yet, add one to \
                 security.allowed_directories.",
            ),
            Self::Validation { .. } => {
                Some("Check the path for typos, empty values or embedded NUL characters.")
            }
            Self::Config { .. } => Some("Fix the JSON syntax of the configuration file."),
            Self::Io(_) => None,
        }
    }
}

fn public_reason(reason: &DenialReason) -> String {
    match reason {
        DenialReason::SystemPath { .. } => {
            format!("path is inside protected system directory {PATH_PLACEHOLDER}")
        }
        DenialReason::SymlinkEscape { .. } => {
            format!("symlink resolves outside the permitted directories to {PATH_PLACEHOLDER}")
        }
        DenialReason::OutsideRoots | DenialReason::NotFound | DenialReason::NotWritable => {
            reason.to_string()
        }
    }
}

fn denial_guidance(reason: &DenialReason, mode: SecurityMode) -> &'static str {
    match (reason, mode) {
        (DenialReason::NotFound, _) => "The path does not exist. Check the spelling.",
        (DenialReason::NotWritable, _) => {
            "The path is not writable by the server process. Choose another destination."
        }
        (DenialReason::SystemPath { .. }, _) => {
            "Protected system directories are never accessible, even in unrestricted mode."
        }
        (DenialReason::SymlinkEscape { .. }, _) => {
            "The path is a symlink that leads outside the permitted directories; use its real target instead."
        }
        (DenialReason::OutsideRoots, SecurityMode::Strict) => {
            "Strict mode only permits the current working directory. Switch to sandboxed mode \
             and allow the directory to work elsewhere."
        }
        (DenialReason::OutsideRoots, SecurityMode::Sandboxed) => {
            "The path is outside the allowed directories. Add its directory to the allow-list \
             if access is intended."
        }
        (DenialReason::OutsideRoots, SecurityMode::Unrestricted) => {
            "The path could not be resolved to a permitted location."
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_codes() {
        assert_eq!(WardenError::validation("x").code(), "VALIDATION_ERROR");
        assert_eq!(
            WardenError::access_denied("x", DenialReason::NotFound).code(),
            "ACCESS_DENIED"
        );
        let io = std::io::Error::other("boom");
        assert_eq!(WardenError::Io(io).code(), "IO_ERROR");
        let cfg = WardenError::Config {
            path: PathBuf::from("c.json"),
            message: "bad".into(),
        };
        assert_eq!(cfg.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_description_is_sanitized() {
        let err = WardenError::access_denied(
            "/home/u/Documents/../../etc/shadow",
            DenialReason::SymlinkEscape {
                real_path: PathBuf::from("/etc/shadow"),
            },
        );
        for mode in [SecurityMode::Strict, SecurityMode::Sandboxed, SecurityMode::Unrestricted] {
            let msg = err.to_user_message(mode);
            assert!(!msg.description.contains("/etc"), "{}", msg.description);
            assert!(!msg.description.contains("/home"), "{}", msg.description);
            assert!(msg.description.contains("<path>"));
        }
    }

    #[test]
    fn test_paths_with_spaces_fully_redacted() {
        let err = WardenError::access_denied(
            "/home/u/My Documents/secret.txt",
            DenialReason::SymlinkEscape {
                real_path: PathBuf::from("/srv/Shared Files/payroll 2024.xlsx"),
            },
        );
        let msg = err.to_user_message(SecurityMode::Sandboxed);
        assert_eq!(
            msg.description,
            "access denied: <path>: symlink resolves outside the permitted directories to <path>"
        );

        let err = WardenError::access_denied(
            "/opt/My Apps/conf",
            DenialReason::SystemPath {
                denied_root: PathBuf::from("/opt/My Apps"),
            },
        );
        let description = err.to_user_message(SecurityMode::Unrestricted).description;
        assert!(!description.contains("Apps"), "{description}");
        assert!(!description.contains("conf"), "{description}");
    }

    #[test]
    fn test_config_path_with_spaces_redacted() {
        let err = WardenError::Config {
            path: PathBuf::from("/home/u/App Support/pathwarden/config.json"),
            message: "expected value at line 1 column 1".into(),
        };
        let description = err.to_user_message(SecurityMode::Strict).description;
        assert_eq!(
            description,
            "invalid configuration <path>: expected value at line 1 column 1"
        );
    }

    #[test]
    fn test_guidance_depends_on_mode() {
        let err = WardenError::access_denied("/x", DenialReason::OutsideRoots);
        let strict = err.to_user_message(SecurityMode::Strict).guidance.unwrap();
        let sandboxed = err.to_user_message(SecurityMode::Sandboxed).guidance.unwrap();
        assert!(strict.contains("Strict mode"));
        assert!(sandboxed.contains("allow-list"));
        assert_ne!(strict, sandboxed);
    }

    #[test]
    fn test_system_path_guidance() {
        let err = WardenError::access_denied(
            "/etc/passwd",
            DenialReason::SystemPath {
                denied_root: PathBuf::from("/etc"),
            },
        );
        let msg = err.to_user_message(SecurityMode::Unrestricted);
        assert!(msg.guidance.unwrap().contains("system directories"));
    }

    #[test]
    fn test_io_has_no_guidance() {
        let err = WardenError::Io(std::io::Error::other("disk full"));
        assert!(err.to_user_message(SecurityMode::Strict).guidance.is_none());
    }

    #[test]
    fn test_user_message_serializes() {
        let err = WardenError::validation("path is empty");
        let json = serde_json::to_string(&err.to_user_message(SecurityMode::Strict)).unwrap();
        assert!(json.contains("\"code\":\"VALIDATION_ERROR\""));
        assert!(json.contains("guidance"));
    }
}
