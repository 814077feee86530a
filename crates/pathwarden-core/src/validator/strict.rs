//! Strict mode: the working directory only.

use std::path::Path;
use std::path::PathBuf;

use super::policy::ModePolicy;
use super::policy::RootSet;
use crate::Result;
use crate::config::SecurityMode;
use crate::path::resolve_real;

/// Permits only the directory the process was started in.
///
/// The root is captured when the policy is built; later `chdir` calls do
/// not move the boundary.
#[derive(Debug, Clone)]
pub struct StrictMode {
    lexical: PathBuf,
    real: PathBuf,
}

impl StrictMode {
    /// Uses `cwd` as the only root.
    #[must_use]
    pub fn new(cwd: &Path) -> Self {
        let real = resolve_real(cwd).map_or_else(|_| cwd.to_path_buf(), |r| r.real_path);
        Self {
            lexical: cwd.to_path_buf(),
            real,
        }
    }

    /// The resolved root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.real
    }
}

impl ModePolicy for StrictMode {
    fn mode(&self) -> SecurityMode {
        SecurityMode::Strict
    }

    fn root_set(&self) -> Result<RootSet> {
        Ok(RootSet::roots(vec![self.real.clone()], vec![self.lexical.clone()]))
    }
}
