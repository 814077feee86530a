//! Mode validators.
//!
//! Every request, whatever the mode, runs the same pipeline in the same
//! order:
//!
//! 1. type check (non-empty, no NUL)
//! 2. normalize (expand `~` and variables, make absolute, collapse `..`)
//! 3. resolve symlinks to the real path
//! 4. containment against the mode's roots
//! 5. mode exclusions (the system deny-list in unrestricted mode)
//! 6. existence and writability, when requested
//!
//! Only the root set and the exclusion step differ between modes; see
//! [`ModePolicy`].

mod access;
mod deny_list;
mod policy;
mod request;
mod sandboxed;
mod strict;
mod unrestricted;

use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

pub use access::is_writable;
pub use deny_list::SystemDenyList;
pub use policy::ModePolicy;
pub use policy::RootSet;
pub use request::ValidationRequest;
pub use sandboxed::SandboxedMode;
pub use strict::StrictMode;
pub use unrestricted::UnrestrictedMode;

use crate::Result;
use crate::WardenError;
use crate::allowlist::AllowListStore;
use crate::config::SecurityMode;
use crate::error::DenialReason;
use crate::path::ExpansionContext;
use crate::path::normalize::check_input;
use crate::path::normalize_with;
use crate::path::resolve_no_follow;
use crate::path::resolve_real;
use crate::types::RealPath;

/// Validates caller-supplied paths against one security mode.
///
/// # Examples
///
/// ```
/// use pathwarden_core::ValidationRequest;
/// use pathwarden_core::path::ExpansionContext;
/// use pathwarden_core::validator::Validator;
///
/// let dir = tempfile::tempdir().unwrap();
/// let validator = Validator::strict(dir.path(), ExpansionContext::isolated()).unwrap();
///
/// assert!(validator.validate(&ValidationRequest::new("notes.txt")).is_ok());
/// let err = validator.validate(&ValidationRequest::new("../../outside")).unwrap_err();
/// assert!(err.is_access_denied());
/// ```
#[derive(Debug)]
pub struct Validator {
    policy: Box<dyn ModePolicy>,
    base: PathBuf,
    ctx: ExpansionContext,
}

impl Validator {
    /// Builds a validator from any policy.
    ///
    /// Relative inputs are joined to `base`, which must be absolute.
    pub fn new(policy: impl ModePolicy + 'static, base: &Path, ctx: ExpansionContext) -> Result<Self> {
        if !base.is_absolute() {
            return Err(WardenError::validation_with(
                "validator base directory must be absolute",
                base.display().to_string(),
            ));
        }
        Ok(Self {
            policy: Box::new(policy),
            base: base.to_path_buf(),
            ctx,
        })
    }

    /// Strict mode rooted at `cwd`.
    pub fn strict(cwd: &Path, ctx: ExpansionContext) -> Result<Self> {
        Self::new(StrictMode::new(cwd), cwd, ctx)
    }

    /// Sandboxed mode backed by `store`. Relative inputs are joined to `cwd`.
    pub fn sandboxed(store: Arc<AllowListStore>, cwd: &Path, ctx: ExpansionContext) -> Result<Self> {
        Self::new(SandboxedMode::new(store), cwd, ctx)
    }

    /// Unrestricted mode with `deny` excluded. Relative inputs are joined to
    /// `cwd`.
    pub fn unrestricted(deny: SystemDenyList, cwd: &Path, ctx: ExpansionContext) -> Result<Self> {
        Self::new(UnrestrictedMode::new(deny), cwd, ctx)
    }

    /// The mode this validator enforces.
    #[must_use]
    pub fn mode(&self) -> SecurityMode {
        self.policy.mode()
    }

    /// The directory relative inputs are joined to.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The root set the next validation would use.
    pub fn root_set(&self) -> Result<RootSet> {
        self.policy.root_set()
    }

    /// Runs the full pipeline on `request`.
    ///
    /// # Errors
    ///
    /// - `WardenError::Validation` for malformed input, a mode that cannot
    ///   serve requests, or a path inside the boundary that cannot be
    ///   resolved (a symlink loop, for example)
    /// - `WardenError::AccessDenied` when the real path falls outside the
    ///   boundary, or an existence/writability requirement is not met
    pub fn validate(&self, request: &ValidationRequest) -> Result<RealPath> {
        let input = request.input();
        check_input(input)?;

        let normalized = normalize_with(input, &self.base, &self.ctx)?;

        let roots = self.policy.root_set()?;

        let resolution = if request.resolves_symlinks() {
            resolve_real(&normalized)
        } else {
            resolve_no_follow(&normalized)
        };
        let resolved = match resolution {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.unresolvable(input, &normalized, &roots, &e)),
        };

        if roots.matching(&resolved.real_path).is_none() {
            let reason = if roots.lexically_contains(&normalized) {
                DenialReason::SymlinkEscape {
                    real_path: resolved.real_path.clone(),
                }
            } else {
                DenialReason::OutsideRoots
            };
            return Err(self.deny(input, reason));
        }

        if let Some(denied_root) = self.policy.excluded(&resolved.real_path) {
            return Err(self.deny(input, DenialReason::SystemPath { denied_root }));
        }

        if request.requires_exists() && !resolved.exists {
            return Err(self.deny(input, DenialReason::NotFound));
        }

        if request.requires_write() && !is_writable(&resolved.real_path) {
            return Err(self.deny(input, DenialReason::NotWritable));
        }

        tracing::debug!(
            mode = %self.mode(),
            real_path = %resolved.real_path.display(),
            exists = resolved.exists,
            "path validated"
        );
        Ok(RealPath::new_unchecked(resolved.real_path, resolved.exists))
    }

    /// Classifies a resolution failure without revealing what exists
    /// outside the boundary: anything lexically outside the roots (or
    /// excluded) is denied the same way a missing path would be.
    fn unresolvable(&self, input: &str, normalized: &Path, roots: &RootSet, err: &io::Error) -> WardenError {
        if !roots.lexically_contains(normalized) {
            return self.deny(input, DenialReason::OutsideRoots);
        }
        if let Some(denied_root) = self.policy.excluded(normalized) {
            return self.deny(input, DenialReason::SystemPath { denied_root });
        }
        WardenError::validation_with("path cannot be resolved", err.to_string())
    }

    fn deny(&self, input: &str, reason: DenialReason) -> WardenError {
        let event = match reason {
            DenialReason::SymlinkEscape { .. } => "symlink_escape",
            DenialReason::SystemPath { .. } => "system_path_denied",
            _ => "path_denied",
        };
        tracing::warn!(
            security_event = event,
            mode = %self.mode(),
            requested = input,
            reason = %reason,
            "path rejected"
        );
        WardenError::access_denied(input, reason)
    }
}
