//! The validation facade handed to file-operation collaborators.

use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::Result;
use crate::WardenError;
use crate::allowlist::AllowListEntry;
use crate::allowlist::AllowListStore;
use crate::archive::ArchiveValidator;
use crate::config::ConfigDocument;
use crate::config::SecurityMode;
use crate::config::resolve_config_path;
use crate::error::DenialReason;
use crate::limits::SecurityLimits;
use crate::path::ExpansionContext;
use crate::path::open_no_follow;
use crate::types::RealPath;
use crate::validator::RootSet;
use crate::validator::SystemDenyList;
use crate::validator::ValidationRequest;
use crate::validator::Validator;

/// What a guarded open is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenIntent {
    /// Read an existing file.
    Read,
    /// Create or truncate a file for writing.
    Write,
    /// Create a file that must not exist yet.
    CreateNew,
    /// Append to a file, creating it if needed.
    Append,
}

impl OpenIntent {
    fn request(self, input: &str) -> ValidationRequest {
        let request = ValidationRequest::new(input);
        match self {
            Self::Read => request.require_exists(true),
            Self::Write | Self::CreateNew | Self::Append => request.check_write(true),
        }
    }

    fn options(self) -> OpenOptions {
        let mut options = OpenOptions::new();
        match self {
            Self::Read => options.read(true),
            Self::Write => options.write(true).create(true).truncate(true),
            Self::CreateNew => options.write(true).create_new(true),
            Self::Append => options.append(true).create(true),
        };
        options
    }
}

/// Snapshot of the active configuration, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Active mode.
    pub mode: SecurityMode,
    /// Configuration file in use, if any.
    pub config_path: Option<PathBuf>,
    /// Directory relative inputs are resolved against.
    pub working_directory: PathBuf,
    /// Permitted roots for the active mode.
    pub roots: Vec<AllowListEntry>,
    /// Whether the system deny-list applies (unrestricted mode only).
    pub deny_list_active: bool,
    /// Deny-list entries, including canonical aliases.
    pub deny_list: Vec<PathBuf>,
    /// Effective limits.
    pub limits: SecurityLimits,
    /// Configuration problems that will make requests fail.
    pub issues: Vec<String>,
}

/// Validates and opens caller-supplied paths under one fixed security mode.
///
/// Built once at startup from the configuration document and shared by
/// reference; the mode cannot change afterwards.
///
/// # Examples
///
/// ```
/// use pathwarden_core::config::ConfigDocument;
/// use pathwarden_core::path::ExpansionContext;
/// use pathwarden_core::{PathWarden, ValidationRequest};
///
/// let dir = tempfile::tempdir().unwrap();
/// let warden = PathWarden::from_document(
///     &ConfigDocument::default(),
///     None,
///     dir.path(),
///     ExpansionContext::isolated(),
/// )
/// .unwrap();
///
/// let real = warden.validate(&ValidationRequest::new("./notes.txt")).unwrap();
/// assert!(real.as_path().ends_with("notes.txt"));
/// ```
#[derive(Debug)]
pub struct PathWarden {
    config_path: Option<PathBuf>,
    cwd: PathBuf,
    validator: Validator,
    store: Arc<AllowListStore>,
    deny: SystemDenyList,
    limits: SecurityLimits,
}

impl PathWarden {
    /// Loads the configuration at `config_path` and builds the warden for
    /// the current working directory and process environment.
    pub fn load(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let doc = ConfigDocument::load(&config_path)?;
        let cwd = std::env::current_dir().map_err(|e| {
            WardenError::validation_with("cannot determine current directory", e.to_string())
        })?;
        Self::from_document(&doc, Some(config_path), &cwd, ExpansionContext::from_process())
    }

    /// Like [`load`](Self::load), using `PATHWARDEN_CONFIG` or the default
    /// location.
    pub fn load_default() -> Result<Self> {
        Self::load(resolve_config_path(None)?)
    }

    /// Builds the warden from an already-parsed document.
    ///
    /// Allow-list mutations are persisted to `config_path` when one is
    /// given and kept in memory otherwise.
    pub fn from_document(
        doc: &ConfigDocument,
        config_path: Option<PathBuf>,
        cwd: &Path,
        ctx: ExpansionContext,
    ) -> Result<Self> {
        let store = Arc::new(AllowListStore::with_entries(
            config_path.clone(),
            doc.security.allowed_directories.clone(),
            cwd,
            ctx.clone(),
        ));
        let deny = SystemDenyList::from_config(&doc.security, cwd, &ctx);
        let limits = SecurityLimits::default().with_overrides(&doc.limits);

        let validator = match doc.security.mode {
            SecurityMode::Strict => Validator::strict(cwd, ctx)?,
            SecurityMode::Sandboxed => Validator::sandboxed(Arc::clone(&store), cwd, ctx)?,
            SecurityMode::Unrestricted => Validator::unrestricted(deny.clone(), cwd, ctx)?,
        };

        tracing::info!(
            mode = %doc.security.mode,
            allowed = doc.security.allowed_directories.len(),
            "path validation configured"
        );

        Ok(Self {
            config_path,
            cwd: cwd.to_path_buf(),
            validator,
            store,
            deny,
            limits,
        })
    }

    /// The active mode.
    #[must_use]
    pub fn mode(&self) -> SecurityMode {
        self.validator.mode()
    }

    /// Runs the validation pipeline.
    ///
    /// # Errors
    ///
    /// See [`Validator::validate`].
    pub fn validate(&self, request: &ValidationRequest) -> Result<RealPath> {
        self.validator.validate(request)
    }

    /// Validates `input` with default options.
    pub fn validate_path(&self, input: &str) -> Result<RealPath> {
        self.validate(&ValidationRequest::new(input))
    }

    /// Validates `input` for `intent` and opens the resulting real path
    /// without following a symlink at the final component.
    ///
    /// A leaf replaced by a symlink between validation and open is reported
    /// as a symlink escape.
    ///
    /// # Errors
    ///
    /// Validation errors as for [`validate`](Self::validate), or
    /// `WardenError::Io` if the open itself fails.
    pub fn open(&self, input: &str, intent: OpenIntent) -> Result<(RealPath, File)> {
        let real = self.validate(&intent.request(input))?;

        match open_no_follow(real.as_path(), &mut intent.options()) {
            Ok(file) => Ok((real, file)),
            Err(e) if is_symlink_refusal(&e) => {
                tracing::warn!(
                    security_event = "symlink_escape",
                    requested = input,
                    real_path = %real.as_path().display(),
                    "leaf became a symlink after validation"
                );
                Err(WardenError::access_denied(
                    input,
                    DenialReason::SymlinkEscape {
                        real_path: real.into_path_buf(),
                    },
                ))
            }
            Err(e) => Err(WardenError::Io(e)),
        }
    }

    /// The allow-list backing sandboxed mode.
    ///
    /// Available in every mode so it can be managed before switching.
    #[must_use]
    pub fn allow_list(&self) -> &AllowListStore {
        &self.store
    }

    /// The system deny-list from configuration.
    #[must_use]
    pub const fn deny_list(&self) -> &SystemDenyList {
        &self.deny
    }

    /// Effective limits.
    #[must_use]
    pub const fn limits(&self) -> &SecurityLimits {
        &self.limits
    }

    /// An archive validator using the effective limits.
    #[must_use]
    pub fn archive_validator(&self) -> ArchiveValidator {
        ArchiveValidator::new(self.limits.clone())
    }

    /// Reports mode, roots, deny-list and limits.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        let mode = self.mode();
        let mut issues = Vec::new();

        let roots = match mode {
            SecurityMode::Sandboxed => {
                let entries = self.store.list();
                if entries.is_empty() {
                    issues.push("sandboxed mode has no allowed directories; every request will fail".to_string());
                }
                for entry in entries.iter().filter(|e| !e.exists) {
                    issues.push(format!("allowed directory {:?} does not exist", entry.original));
                }
                entries
            }
            SecurityMode::Strict | SecurityMode::Unrestricted => match self.validator.root_set() {
                Ok(RootSet::Roots { real, .. }) => real
                    .into_iter()
                    .map(|root| AllowListEntry {
                        original: ".".to_string(),
                        exists: root.is_dir(),
                        normalized: Some(root),
                    })
                    .collect(),
                _ => vec![AllowListEntry {
                    original: "*".to_string(),
                    normalized: None,
                    exists: true,
                }],
            },
        };

        StatusReport {
            mode,
            config_path: self.config_path.clone(),
            working_directory: self.cwd.clone(),
            roots,
            deny_list_active: mode == SecurityMode::Unrestricted && !self.deny.is_empty(),
            deny_list: self.deny.entries().to_vec(),
            limits: self.limits.clone(),
            issues,
        }
    }
}

#[cfg(unix)]
fn is_symlink_refusal(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_symlink_refusal(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}
