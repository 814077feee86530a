//! Symlink-aware real-path resolution and no-follow opening.
//!
//! Containment is always decided on the real location of a path, never on
//! the string the caller sent. For targets that exist this is `realpath`.
//! For targets that do not exist yet the nearest existing ancestor is
//! canonicalized and the missing tail appended; dangling symlinks along the
//! way are followed to where they would create the file.
//!
//! # TOCTOU
//!
//! Resolution and use are separate syscalls. [`open_no_follow`] narrows the
//! window on Unix by refusing to follow a symlink at the final component
//! (`O_NOFOLLOW`), so a leaf swapped for a link after validation fails with
//! `ELOOP`. Intermediate directories swapped between check and use are not
//! covered; closing that gap needs `openat2(RESOLVE_BENEATH)` or an
//! equivalent per-platform walk. Windows only gets a post-open check.

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::normalize::lexical_clean;

/// Upper bound on symlink hops, matching the Linux `MAXSYMLINKS` value.
const MAX_SYMLINK_HOPS: usize = 40;

/// Outcome of real-path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Canonical location the path refers to (or would refer to once
    /// created).
    pub real_path: PathBuf,
    /// Whether the target exists right now.
    pub exists: bool,
}

/// Resolves `path` to its real location, following symlinks.
///
/// `path` should already be absolute and normalized.
///
/// # Errors
///
/// Returns an I/O error for symlink loops, permission failures while
/// probing, or any error other than "not found" and "not a directory".
///
/// # Examples
///
/// ```no_run
/// use pathwarden_core::path::resolve_real;
/// use std::path::Path;
///
/// # fn main() -> std::io::Result<()> {
/// let resolved = resolve_real(Path::new("/tmp/new-dir/file.txt"))?;
/// assert!(!resolved.exists);
/// # Ok(())
/// # }
/// ```
pub fn resolve_real(path: &Path) -> io::Result<Resolved> {
    resolve_inner(path, 0)
}

fn resolve_inner(path: &Path, hops: usize) -> io::Result<Resolved> {
    if hops > MAX_SYMLINK_HOPS {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("too many levels of symbolic links: {}", path.display()),
        ));
    }

    match fs::canonicalize(path) {
        Ok(real_path) => {
            return Ok(Resolved {
                real_path,
                exists: true,
            });
        }
        // A regular file in the middle of the path is as good as missing:
        // fall back to the nearest ancestor either way.
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {}
        Err(e) => return Err(e),
    }

    // A dangling symlink: creating the path would create the link target.
    if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
        let target = fs::read_link(path)?;
        let base = path.parent().unwrap_or(path);
        let next = resolve_inner(&base.join(target), hops + 1)?;
        return Ok(Resolved {
            real_path: next.real_path,
            exists: false,
        });
    }

    let Some(last) = path.components().next_back() else {
        return Ok(Resolved {
            real_path: lexical_clean(path),
            exists: false,
        });
    };

    let real_path = match (last, path.parent()) {
        (Component::Normal(name), Some(parent)) => resolve_inner(parent, hops)?.real_path.join(name),
        (Component::CurDir, Some(parent)) => resolve_inner(parent, hops)?.real_path,
        (Component::ParentDir, Some(parent)) => {
            let base = resolve_inner(parent, hops)?.real_path;
            base.parent().map_or_else(|| base.clone(), Path::to_path_buf)
        }
        // No ancestor exists (e.g. a missing drive); containment will
        // normally fail closed on the lexical form.
        _ => lexical_clean(path),
    };

    Ok(Resolved {
        real_path,
        exists: false,
    })
}

/// Resolves `path` without following a symlink at the final component.
///
/// The parent is canonicalized and the literal file name appended, so the
/// result names the link itself. Used by operations that act on a link
/// (move, delete) rather than on its target.
pub fn resolve_no_follow(path: &Path) -> io::Result<Resolved> {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return resolve_real(path);
    };

    let parent = resolve_real(parent)?;
    let exists = fs::symlink_metadata(path).is_ok();
    Ok(Resolved {
        real_path: parent.real_path.join(name),
        exists,
    })
}

/// Opens `path` without following a symlink at the final component.
///
/// On Unix this adds `O_NOFOLLOW` to `options`; a symlink leaf fails with
/// `ELOOP`. Elsewhere the file is opened normally and rejected afterwards if
/// the leaf turned out to be a symlink.
pub fn open_no_follow(path: &Path, options: &mut OpenOptions) -> io::Result<File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;

        options.custom_flags(libc::O_NOFOLLOW);
        options.open(path)
    }

    #[cfg(not(unix))]
    {
        let file = options.open(path)?;
        if fs::symlink_metadata(path)?.file_type().is_symlink() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("refusing to use symlink: {}", path.display()),
            ));
        }
        Ok(file)
    }
}
