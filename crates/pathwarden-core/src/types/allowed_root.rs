//! Allow-list root pairing the user's spelling with its expansion.

use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::Result;
use crate::path::ExpansionContext;
use crate::path::normalize_with;

/// A permitted root directory.
///
/// `original` is persisted verbatim (it may use `~` or environment
/// variables and is therefore portable across machines). `normalized` is
/// derived on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedRoot {
    original: String,
    normalized: PathBuf,
}

impl AllowedRoot {
    /// Expands and normalizes `original` against `base`.
    pub fn new(original: impl Into<String>, base: &Path, ctx: &ExpansionContext) -> Result<Self> {
        let original = original.into();
        let normalized = normalize_with(&original, base, ctx)?;
        Ok(Self {
            original,
            normalized,
        })
    }

    /// The user-facing, persisted form.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The absolute, lexically normalized form.
    #[must_use]
    pub fn normalized(&self) -> &Path {
        &self.normalized
    }

    /// Returns `true` if `entry` names this root by either form.
    #[must_use]
    pub fn matches(&self, entry: &str, entry_normalized: Option<&Path>) -> bool {
        self.original == entry || entry_normalized.is_some_and(|n| n == self.normalized)
    }
}
