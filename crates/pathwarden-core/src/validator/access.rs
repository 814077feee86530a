//! Writability checks.

use std::path::Path;

/// Returns `true` if `path` is writable, or, when it does not exist, if its
/// nearest existing ancestor is.
///
/// The check asks the operating system rather than inspecting mode bits, so
/// ACLs, read-only mounts and effective ids are all taken into account.
#[must_use]
pub fn is_writable(path: &Path) -> bool {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.symlink_metadata().is_ok())
        .is_some_and(os_allows_write)
}

#[cfg(unix)]
fn os_allows_write(path: &Path) -> bool {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };

    // SAFETY: `c_path` is a valid NUL-terminated string that outlives the
    // call, and access(2) does not retain the pointer.
    #[allow(unsafe_code)]
    let rc = unsafe { libc::access(c_path.as_ptr(), libc::W_OK) };
    rc == 0
}

#[cfg(not(unix))]
fn os_allows_write(path: &Path) -> bool {
    path.metadata()
        .is_ok_and(|meta| !meta.permissions().readonly())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_existing_dir_writable() {
        let temp = TempDir::new().expect("failed to create temp dir");
        assert!(is_writable(temp.path()));
    }

    #[test]
    fn test_missing_target_uses_ancestor() {
        let temp = TempDir::new().expect("failed to create temp dir");
        assert!(is_writable(&temp.path().join("a").join("b").join("c.txt")));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_dir() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("failed to create temp dir");
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // root bypasses mode bits
        if !running_as_root() {
            assert!(!is_writable(&locked.join("new.txt")));
        }

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    fn running_as_root() -> bool {
        use std::os::unix::fs::MetadataExt;
        // a fresh file is owned by the effective uid
        let temp = TempDir::new().expect("failed to create temp dir");
        let marker = temp.path().join("uid");
        fs::write(&marker, "").unwrap();
        fs::metadata(&marker).unwrap().uid() == 0
    }
}
