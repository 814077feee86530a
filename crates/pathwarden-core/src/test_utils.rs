//! Test utilities for building archive fixtures.
//!
//! The safe builders go through the `tar` and `zip` writers. The raw helpers
//! write header bytes directly so that names and link targets the writers
//! refuse (`..`, absolute paths) can still be produced for hostile-input
//! tests.
//!
//! Only compiled for this crate's own unit tests or with the `test-utils`
//! feature, which dev-dependencies enable.
//!
//! # Panics
//!
//! All functions in this module may panic on I/O errors since they are
//! designed for test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;

/// Creates an in-memory TAR archive from a list of entries.
///
/// Each entry is a tuple of (path, content). Files are created with mode 0o644.
///
/// # Examples
///
/// ```
/// use pathwarden_core::test_utils::create_test_tar;
///
/// let tar_data = create_test_tar(vec![("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// ```
#[must_use]
pub fn create_test_tar(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut ar = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        ar.append_data(&mut header, path, data).unwrap();
    }
    ar.into_inner().unwrap()
}

/// Like [`create_test_tar`], gzip-compressed.
#[must_use]
pub fn create_test_tar_gz(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&create_test_tar(entries)).unwrap();
    encoder.finish().unwrap()
}

/// Creates an in-memory ZIP archive with stored (uncompressed) members.
///
/// # Examples
///
/// ```
/// use pathwarden_core::test_utils::create_test_zip;
///
/// let zip_data = create_test_zip(vec![("file.txt", b"hello"), ("dir/nested.txt", b"world")]);
/// ```
#[must_use]
pub fn create_test_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    build_zip(entries, zip::CompressionMethod::Stored)
}

/// Creates an in-memory ZIP archive with deflated members.
#[must_use]
pub fn create_deflated_zip(entries: Vec<(&str, &[u8])>) -> Vec<u8> {
    build_zip(entries, zip::CompressionMethod::Deflated)
}

fn build_zip(entries: Vec<(&str, &[u8])>, method: zip::CompressionMethod) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(method)
        .unix_permissions(0o644);

    for (path, data) in entries {
        zip.start_file(path, options).unwrap();
        zip.write_all(data).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// One member of a TAR built by [`create_raw_tar`].
#[derive(Debug, Clone, Copy)]
pub enum RawMember<'a> {
    /// A regular file with contents.
    File(&'a str, &'a [u8]),
    /// A directory.
    Dir(&'a str),
    /// A symlink `(name, target)`.
    Symlink(&'a str, &'a str),
    /// A hard link `(name, target)`.
    Hardlink(&'a str, &'a str),
}

/// Creates a TAR whose header names and link names are written verbatim.
///
/// Names and link targets must fit the 100-byte legacy fields.
///
/// # Examples
///
/// ```
/// use pathwarden_core::test_utils::{RawMember, create_raw_tar};
///
/// let tar_data = create_raw_tar(&[
///     RawMember::Symlink("evil", "/etc"),
///     RawMember::File("evil/cron.d/job", b"* * * * * root sh"),
/// ]);
/// assert_eq!(tar_data.len() % 512, 0);
/// ```
#[must_use]
pub fn create_raw_tar(members: &[RawMember<'_>]) -> Vec<u8> {
    let mut ar = tar::Builder::new(Vec::new());
    for member in members {
        let (name, link, data, kind, mode): (&str, Option<&str>, &[u8], tar::EntryType, u32) = match *member {
            RawMember::File(name, data) => (name, None, data, tar::EntryType::Regular, 0o644),
            RawMember::Dir(name) => (name, None, &b""[..], tar::EntryType::Directory, 0o755),
            RawMember::Symlink(name, target) => (name, Some(target), &b""[..], tar::EntryType::Symlink, 0o777),
            RawMember::Hardlink(name, target) => (name, Some(target), &b""[..], tar::EntryType::Link, 0o644),
        };
        assert!(name.len() <= 100, "raw tar names are limited to 100 bytes");

        let mut header = tar::Header::new_old();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        if let Some(link) = link {
            assert!(link.len() <= 100, "raw tar link names are limited to 100 bytes");
            header.as_old_mut().linkname[..link.len()].copy_from_slice(link.as_bytes());
        }
        header.set_size(data.len() as u64);
        header.set_mode(mode);
        header.set_entry_type(kind);
        header.set_cksum();
        ar.append(&header, data).unwrap();
    }
    ar.into_inner().unwrap()
}

/// Creates a single-entry TAR whose header name is written verbatim.
///
/// `name` must fit the 100-byte legacy name field.
///
/// # Examples
///
/// ```
/// use pathwarden_core::test_utils::raw_tar_with_name;
///
/// let tar_data = raw_tar_with_name("../../etc/passwd", b"root:x:0:0");
/// assert_eq!(tar_data.len() % 512, 0);
/// ```
#[must_use]
pub fn raw_tar_with_name(name: &str, data: &[u8]) -> Vec<u8> {
    create_raw_tar(&[RawMember::File(name, data)])
}

/// Creates a ZIP holding one symlink member `name -> target`.
#[must_use]
pub fn create_zip_with_symlink(name: &str, target: &str) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::write::ZipWriter;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.add_symlink(name, target, SimpleFileOptions::default()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Writes `data` to `dir/name` and returns the path.
pub fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_name_survives_round_trip() {
        let data = raw_tar_with_name("/abs/name", b"x");
        let mut archive = tar::Archive::new(Cursor::new(data));
        let entry = archive.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(&*entry.path_bytes(), b"/abs/name");
    }

    #[test]
    fn test_raw_link_names_survive_round_trip() {
        let data = create_raw_tar(&[RawMember::Symlink("evil", "/etc"), RawMember::Hardlink("h", "../x")]);
        let mut archive = tar::Archive::new(Cursor::new(data));
        let links: Vec<(tar::EntryType, Vec<u8>)> = archive
            .entries()
            .unwrap()
            .map(|e| {
                let e = e.unwrap();
                (e.header().entry_type(), e.link_name_bytes().unwrap().into_owned())
            })
            .collect();
        assert_eq!(
            links,
            vec![
                (tar::EntryType::Symlink, b"/etc".to_vec()),
                (tar::EntryType::Link, b"../x".to_vec()),
            ]
        );
    }

    #[test]
    fn test_zip_builders_differ_in_method() {
        let payload = vec![0u8; 4096];
        let stored = create_test_zip(vec![("z", payload.as_slice())]);
        let deflated = create_deflated_zip(vec![("z", payload.as_slice())]);
        assert!(deflated.len() < stored.len());
    }
}
