//! Unrestricted mode: the whole filesystem minus protected system paths.

use std::path::Path;
use std::path::PathBuf;

use super::deny_list::SystemDenyList;
use super::policy::ModePolicy;
use super::policy::RootSet;
use crate::Result;
use crate::config::SecurityMode;

/// Permits every absolute path except those under a deny-listed system
/// directory.
#[derive(Debug, Clone)]
pub struct UnrestrictedMode {
    deny: SystemDenyList,
}

impl UnrestrictedMode {
    #[must_use]
    pub const fn new(deny: SystemDenyList) -> Self {
        Self { deny }
    }

    #[must_use]
    pub const fn deny_list(&self) -> &SystemDenyList {
        &self.deny
    }
}

impl ModePolicy for UnrestrictedMode {
    fn mode(&self) -> SecurityMode {
        SecurityMode::Unrestricted
    }

    fn root_set(&self) -> Result<RootSet> {
        Ok(RootSet::Filesystem)
    }

    fn excluded(&self, real: &Path) -> Option<PathBuf> {
        self.deny.matching(real).map(Path::to_path_buf)
    }
}
