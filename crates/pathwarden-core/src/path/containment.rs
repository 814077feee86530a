//! Separator-aware containment checks.
//!
//! A candidate is contained in a root iff it equals the root or continues
//! the root with a separator and more components. Comparison is per
//! component, so `/allowed-evil` is never inside `/allowed`.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Returns `true` if `candidate` equals `root` or lies beneath it.
///
/// Both paths must be absolute and free of `..`; anything else fails
/// closed.
///
/// # Examples
///
/// ```
/// use pathwarden_core::path::is_contained;
/// use std::path::Path;
///
/// assert!(is_contained(Path::new("/allowed"), Path::new("/allowed")));
/// assert!(is_contained(Path::new("/allowed/a/b"), Path::new("/allowed")));
/// assert!(!is_contained(Path::new("/allowed-evil"), Path::new("/allowed")));
/// assert!(!is_contained(Path::new("/"), Path::new("/allowed")));
/// ```
#[must_use]
pub fn is_contained(candidate: &Path, root: &Path) -> bool {
    if !candidate.is_absolute() || !root.is_absolute() {
        return false;
    }
    if has_parent_component(candidate) || has_parent_component(root) {
        return false;
    }

    let mut candidate_components = candidate.components();
    for root_component in root.components() {
        match candidate_components.next() {
            Some(c) if component_eq(c, root_component) => {}
            _ => return false,
        }
    }
    true
}

/// Returns the first root that contains `candidate`, if any.
#[must_use]
pub fn matching_root<'a, I>(candidate: &Path, roots: I) -> Option<&'a Path>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    roots
        .into_iter()
        .map(PathBuf::as_path)
        .find(|root| is_contained(candidate, root))
}

/// Returns `true` if any root contains `candidate`.
#[must_use]
pub fn is_contained_in_any<'a, I>(candidate: &Path, roots: I) -> bool
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    matching_root(candidate, roots).is_some()
}

/// Strips trailing separators and removes duplicate roots, keeping the
/// first occurrence of each.
#[must_use]
pub fn dedup_roots(roots: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for root in roots {
        let root: PathBuf = root.components().collect();
        if !out.iter().any(|seen| paths_eq(seen, &root)) {
            out.push(root);
        }
    }
    out
}

fn has_parent_component(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

fn paths_eq(a: &Path, b: &Path) -> bool {
    is_contained(a, b) && is_contained(b, a)
}

#[cfg(not(windows))]
fn component_eq(a: Component<'_>, b: Component<'_>) -> bool {
    a == b
}

// NTFS is case-insensitive by default.
#[cfg(windows)]
fn component_eq(a: Component<'_>, b: Component<'_>) -> bool {
    a.as_os_str()
        .to_string_lossy()
        .eq_ignore_ascii_case(&b.as_os_str().to_string_lossy())
}
