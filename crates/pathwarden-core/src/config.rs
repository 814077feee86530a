//! Configuration document and security mode.
//!
//! The document is JSON and may be shared with other components of the
//! file-organization server, so keys this crate does not know about are
//! carried through every rewrite untouched.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::Result;
use crate::WardenError;

/// Environment variable that overrides the default configuration location.
pub const CONFIG_ENV_VAR: &str = "PATHWARDEN_CONFIG";

/// Which root-set policy the validator consults.
///
/// Selected once at startup and fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Only the current working directory.
    #[default]
    Strict,
    /// Only the directories on the allow-list.
    Sandboxed,
    /// The whole filesystem minus the system deny-list.
    Unrestricted,
}

impl SecurityMode {
    /// Returns the lowercase configuration spelling of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Sandboxed => "sandboxed",
            Self::Unrestricted => "unrestricted",
        }
    }
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityMode {
    type Err = WardenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "sandboxed" => Ok(Self::Sandboxed),
            "unrestricted" => Ok(Self::Unrestricted),
            other => Err(WardenError::validation_with(
                "unknown security mode",
                format!("expected strict, sandboxed or unrestricted, got {other:?}"),
            )),
        }
    }
}

/// The `security` section of the configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySection {
    /// Active security mode.
    #[serde(default)]
    pub mode: SecurityMode,

    /// Allow-list entries exactly as the user wrote them (unexpanded).
    #[serde(default)]
    pub allowed_directories: Vec<String>,

    /// Whether the system deny-list applies in unrestricted mode.
    #[serde(default = "default_true")]
    pub blacklist_system_paths: bool,

    /// Replacement deny-list; `None` keeps the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_paths: Option<Vec<String>>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            mode: SecurityMode::default(),
            allowed_directories: Vec::new(),
            blacklist_system_paths: true,
            system_paths: None,
            extra: Map::new(),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// The `limits` section of the configuration document.
///
/// These values are consumed by organization-layer collaborators. Where they
/// overlap a core limit they can only tighten it; see
/// [`SecurityLimits::with_overrides`](crate::limits::SecurityLimits::with_overrides).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsSection {
    /// Maximum size of a single file in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,

    /// Maximum number of files touched by one operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files_per_operation: Option<usize>,

    /// Maximum directory depth an operation may descend to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_directory_depth: Option<usize>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// The whole configuration document.
///
/// # Examples
///
/// ```
/// use pathwarden_core::config::{ConfigDocument, SecurityMode};
///
/// let doc: ConfigDocument = serde_json::from_str(
///     r#"{"security": {"mode": "sandboxed", "allowed_directories": ["~/Documents"]}}"#,
/// )
/// .unwrap();
/// assert_eq!(doc.security.mode, SecurityMode::Sandboxed);
/// assert!(doc.security.blacklist_system_paths);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    /// Security settings.
    #[serde(default)]
    pub security: SecuritySection,

    /// Resource limits.
    #[serde(default)]
    pub limits: LimitsSection,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ConfigDocument {
    /// Loads the document from `path`.
    ///
    /// A missing file yields the default document (strict mode, empty
    /// allow-list), which is the intended unattended first-run state.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "configuration file absent, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(WardenError::Io(e)),
        };

        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&text).map_err(|e| WardenError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Writes the document to `path` atomically.
    ///
    /// The JSON is written to a temporary file in the same directory and then
    /// renamed over the target, so readers never observe a torn document.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let json = serde_json::to_string_pretty(self).map_err(|e| WardenError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| WardenError::Io(e.error))?;
        Ok(())
    }
}

/// Returns the configuration path to use.
///
/// Precedence: explicit argument, then `PATHWARDEN_CONFIG`, then
/// `<config dir>/pathwarden/config.json`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("pathwarden").join("config.json"))
        .ok_or_else(|| {
            WardenError::validation_with(
                "cannot determine configuration directory",
                format!("set {CONFIG_ENV_VAR} or pass an explicit configuration path"),
            )
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("strict".parse::<SecurityMode>().unwrap(), SecurityMode::Strict);
        assert_eq!(" Sandboxed ".parse::<SecurityMode>().unwrap(), SecurityMode::Sandboxed);
        assert_eq!(
            "UNRESTRICTED".parse::<SecurityMode>().unwrap(),
            SecurityMode::Unrestricted
        );
        let err = "open".parse::<SecurityMode>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_mode_serde_lowercase() {
        let json = serde_json::to_string(&SecurityMode::Unrestricted).unwrap();
        assert_eq!(json, "\"unrestricted\"");
    }

    #[test]
    fn test_default_document() {
        let doc = ConfigDocument::default();
        assert_eq!(doc.security.mode, SecurityMode::Strict);
        assert!(doc.security.allowed_directories.is_empty());
        assert!(doc.security.blacklist_system_paths);
        assert!(doc.security.system_paths.is_none());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let doc = ConfigDocument::load(&temp.path().join("absent.json")).unwrap();
        assert_eq!(doc, ConfigDocument::default());
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = ConfigDocument::load(&path).unwrap_err();
        assert!(matches!(err, WardenError::Config { .. }));
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "security": {"mode": "sandboxed", "allowed_directories": [], "audit": true},
                "organization": {"music_pattern": "{artist}/{album}"}
            }"#,
        )
        .unwrap();

        let mut doc = ConfigDocument::load(&path).unwrap();
        doc.security.allowed_directories.push("~/Music".into());
        doc.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["organization"]["music_pattern"], "{artist}/{album}");
        assert_eq!(raw["security"]["audit"], true);
        assert_eq!(raw["security"]["allowed_directories"][0], "~/Music");
        assert_eq!(raw["security"]["mode"], "sandboxed");
    }

    #[test]
    fn test_save_preserves_unknown_limit_keys() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"limits": {"max_file_size": 5, "max_concurrent_moves": 4}}"#).unwrap();

        let doc = ConfigDocument::load(&path).unwrap();
        assert_eq!(doc.limits.max_file_size, Some(5));
        doc.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["limits"]["max_concurrent_moves"], 4);
        assert_eq!(raw["limits"]["max_file_size"], 5);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = temp.path().join("nested").join("dir").join("config.json");
        ConfigDocument::default().save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_limits_section_roundtrip_skips_none() {
        let doc = ConfigDocument::default();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("max_file_size"));
        assert!(!json.contains("system_paths"));
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/tmp/explicit.json"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/explicit.json"));
    }
}
