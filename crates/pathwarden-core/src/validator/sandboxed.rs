//! Sandboxed mode: the allow-list only.

use std::path::PathBuf;
use std::sync::Arc;

use super::policy::ModePolicy;
use super::policy::RootSet;
use crate::Result;
use crate::WardenError;
use crate::allowlist::AllowListStore;
use crate::config::SecurityMode;
use crate::path::dedup_roots;
use crate::path::resolve_real;

/// Permits the directories on the allow-list.
///
/// The list is read on every call, so entries added or removed at runtime
/// take effect on the next validation. An empty list denies everything by
/// failing validation outright.
#[derive(Debug, Clone)]
pub struct SandboxedMode {
    store: Arc<AllowListStore>,
}

impl SandboxedMode {
    #[must_use]
    pub const fn new(store: Arc<AllowListStore>) -> Self {
        Self { store }
    }

    /// The backing allow-list.
    #[must_use]
    pub fn store(&self) -> &AllowListStore {
        &self.store
    }
}

impl ModePolicy for SandboxedMode {
    fn mode(&self) -> SecurityMode {
        SecurityMode::Sandboxed
    }

    fn root_set(&self) -> Result<RootSet> {
        let lexical = self.store.normalized_roots();
        if lexical.is_empty() {
            return Err(WardenError::validation_with(
                "no allowed directories configured",
                "sandboxed mode needs at least one entry in security.allowed_directories",
            ));
        }

        let real = dedup_roots(lexical.iter().map(|root| {
            resolve_real(root).map_or_else(|_| root.clone(), |r| r.real_path)
        }));
        Ok(RootSet::roots(real, lexical))
    }
}
