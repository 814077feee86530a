//! Persisted allow-list of directories for sandboxed mode.
//!
//! Entries are stored exactly as the user wrote them (`~/Documents`,
//! `$PROJECTS/inbox`) so the configuration stays portable; the absolute form
//! is derived whenever it is needed.
//!
//! # Concurrency
//!
//! Mutations are serialized through an in-process mutex and re-read the
//! configuration file before writing, so two concurrent `add` calls cannot
//! drop each other's entry. There is no cross-process lock: if several
//! processes share one file, the last writer wins.

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;

use serde::Serialize;

use crate::Result;
use crate::WardenError;
use crate::config::ConfigDocument;
use crate::path::ExpansionContext;
use crate::path::dedup_roots;
use crate::path::matching_root;
use crate::path::normalize::check_input;
use crate::path::normalize_with;
use crate::types::AllowedRoot;

/// Options for [`AllowListStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOptions {
    /// Create the directory (and parents) if it does not exist.
    pub create_if_missing: bool,
    /// Reject directories that do not exist or are not directories.
    pub validate_exists: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            validate_exists: true,
        }
    }
}

/// One allow-list entry as reported by [`AllowListStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowListEntry {
    /// The persisted spelling.
    pub original: String,
    /// The expanded absolute form, if the entry still expands.
    pub normalized: Option<PathBuf>,
    /// Whether the normalized directory exists right now.
    pub exists: bool,
}

/// Which allow-list entry admitted a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowMatch {
    /// The persisted spelling of the matching entry.
    pub original: String,
    /// Its normalized form.
    pub root: PathBuf,
}

/// The allow-list, backed by the `security.allowed_directories` array of a
/// configuration document.
///
/// # Examples
///
/// ```
/// use pathwarden_core::allowlist::{AddOptions, AllowListStore};
/// use pathwarden_core::path::ExpansionContext;
/// use std::path::Path;
///
/// let store = AllowListStore::in_memory(Vec::new(), Path::new("/"), ExpansionContext::isolated());
/// let options = AddOptions { validate_exists: false, ..Default::default() };
/// store.add("/srv/media", options).unwrap();
///
/// assert!(store.is_path_allowed("/srv/media/album/track.flac").unwrap().is_some());
/// assert!(store.is_path_allowed("/srv/media-evil").unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct AllowListStore {
    config_path: Option<PathBuf>,
    base: PathBuf,
    ctx: ExpansionContext,
    entries: RwLock<Vec<String>>,
    write_lock: Mutex<()>,
}

impl AllowListStore {
    /// Opens the store backed by the configuration file at `config_path`.
    ///
    /// Relative entries are resolved against `base`.
    pub fn open(config_path: impl Into<PathBuf>, base: &Path, ctx: ExpansionContext) -> Result<Self> {
        let config_path = config_path.into();
        let doc = ConfigDocument::load(&config_path)?;
        Ok(Self::with_entries(
            Some(config_path),
            doc.security.allowed_directories,
            base,
            ctx,
        ))
    }

    /// Creates a store that lives only in memory.
    #[must_use]
    pub fn in_memory(entries: Vec<String>, base: &Path, ctx: ExpansionContext) -> Self {
        Self::with_entries(None, entries, base, ctx)
    }

    pub(crate) fn with_entries(
        config_path: Option<PathBuf>,
        entries: Vec<String>,
        base: &Path,
        ctx: ExpansionContext,
    ) -> Self {
        Self {
            config_path,
            base: base.to_path_buf(),
            ctx,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        }
    }

    /// The configuration file backing this store, if any.
    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Adds `directory` to the allow-list.
    ///
    /// The candidate is normalized, optionally created or checked for
    /// existence, compared against existing entries by normalized form, and
    /// then persisted in its original spelling.
    ///
    /// # Errors
    ///
    /// - `WardenError::Validation` for malformed input, a missing directory
    ///   when `validate_exists` is set, or a duplicate entry
    /// - `WardenError::Io` / `WardenError::Config` if persisting fails
    pub fn add(&self, directory: &str, options: AddOptions) -> Result<AllowedRoot> {
        check_input(directory)?;
        let root = AllowedRoot::new(directory.trim(), &self.base, &self.ctx)?;
        let normalized = root.normalized();

        if options.create_if_missing && !normalized.exists() {
            fs::create_dir_all(normalized)?;
            tracing::info!(directory = %normalized.display(), "created allowed directory");
        }

        if options.validate_exists {
            match fs::metadata(normalized) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => {
                    return Err(WardenError::validation_with(
                        "allowed entry is not a directory",
                        normalized.display().to_string(),
                    ));
                }
                Err(_) => {
                    return Err(WardenError::validation_with(
                        "allowed directory does not exist",
                        normalized.display().to_string(),
                    ));
                }
            }
        }

        self.mutate(|entries| {
            if let Some(existing) = entries
                .iter()
                .find(|e| self.normalize_entry(e).as_deref() == Some(normalized))
            {
                return Err(WardenError::validation_with(
                    "directory is already allowed",
                    format!("matches existing entry {existing:?}"),
                ));
            }
            entries.push(root.original().to_string());
            Ok(())
        })?;

        tracing::info!(
            directory = root.original(),
            normalized = %normalized.display(),
            "added allowed directory"
        );
        Ok(root)
    }

    /// Removes `directory`, matching either the persisted spelling or the
    /// normalized form.
    ///
    /// # Errors
    ///
    /// Returns `WardenError::Validation` if no entry matches.
    pub fn remove(&self, directory: &str) -> Result<String> {
        check_input(directory)?;
        let wanted = directory.trim();
        let wanted_normalized = self.normalize_entry(wanted);

        let removed = self.mutate(|entries| {
            let position = entries.iter().position(|e| {
                e == wanted
                    || (wanted_normalized.is_some()
                        && self.normalize_entry(e) == wanted_normalized)
            });
            position.map(|i| entries.remove(i)).ok_or_else(|| {
                WardenError::validation_with(
                    "directory is not on the allow-list",
                    wanted.to_string(),
                )
            })
        })?;

        tracing::info!(directory = %removed, "removed allowed directory");
        Ok(removed)
    }

    /// Lists every entry with its normalized form and whether it exists.
    #[must_use]
    pub fn list(&self) -> Vec<AllowListEntry> {
        self.snapshot()
            .into_iter()
            .map(|original| {
                let normalized = self.normalize_entry(&original);
                let exists = normalized.as_deref().is_some_and(Path::is_dir);
                AllowListEntry {
                    original,
                    normalized,
                    exists,
                }
            })
            .collect()
    }

    /// Returns every entry that still expands, deduplicated by normalized
    /// form.
    ///
    /// Entries that no longer expand (for example `~` without a home
    /// directory) are skipped with a warning.
    #[must_use]
    pub fn roots(&self) -> Vec<AllowedRoot> {
        let mut roots: Vec<AllowedRoot> = Vec::new();
        for original in self.snapshot() {
            match AllowedRoot::new(original.as_str(), &self.base, &self.ctx) {
                Ok(root) => {
                    if !roots.iter().any(|r| r.normalized() == root.normalized()) {
                        roots.push(root);
                    }
                }
                Err(e) => {
                    tracing::warn!(entry = %original, error = %e, "skipping allow-list entry");
                }
            }
        }
        roots
    }

    /// Returns the normalized roots, deduplicated, in persisted order.
    #[must_use]
    pub fn normalized_roots(&self) -> Vec<PathBuf> {
        dedup_roots(self.roots().into_iter().map(|r| r.normalized().to_path_buf()))
    }

    /// Returns `true` if the allow-list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Reports which entry, if any, lexically contains `path`.
    ///
    /// This is a diagnostic; it does not resolve symlinks. Use the validator
    /// to decide whether an operation may proceed.
    pub fn is_path_allowed(&self, path: &str) -> Result<Option<AllowMatch>> {
        let candidate = normalize_with(path, &self.base, &self.ctx)?;
        let roots = self.roots();
        let normalized: Vec<PathBuf> = roots.iter().map(|r| r.normalized().to_path_buf()).collect();

        Ok(matching_root(&candidate, &normalized).and_then(|matched| {
            roots
                .iter()
                .find(|r| r.normalized() == matched)
                .map(|r| AllowMatch {
                    original: r.original().to_string(),
                    root: r.normalized().to_path_buf(),
                })
        }))
    }

    fn snapshot(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn normalize_entry(&self, entry: &str) -> Option<PathBuf> {
        normalize_with(entry, &self.base, &self.ctx).ok()
    }

    /// Read-modify-write under the store mutex.
    ///
    /// The backing file is re-read while the lock is held so an update is
    /// always applied to the latest persisted list.
    fn mutate<T>(&self, apply: impl FnOnce(&mut Vec<String>) -> Result<T>) -> Result<T> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let out = if let Some(path) = &self.config_path {
            let mut doc = ConfigDocument::load(path)?;
            let out = apply(&mut doc.security.allowed_directories)?;
            doc.save(path)?;
            *self.entries.write().unwrap_or_else(PoisonError::into_inner) =
                doc.security.allowed_directories;
            out
        } else {
            let mut entries = self.snapshot();
            let out = apply(&mut entries)?;
            *self.entries.write().unwrap_or_else(PoisonError::into_inner) = entries;
            out
        };

        Ok(out)
    }
}
