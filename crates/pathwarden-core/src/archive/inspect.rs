//! Reading archive entry lists without extracting.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use serde::Serialize;
use xz2::read::XzDecoder;

use super::ArchiveEntry;
use super::ArchiveError;
use super::EntryKind;
use super::detect::ArchiveFormat;
use super::detect::detect_format;
use crate::io::BoundedReader;
use crate::io::CompressedSize;
use crate::io::CountingReader;
use crate::io::DecompressionLimit;
use crate::limits::SecurityLimits;

/// Entry list of one archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveListing {
    /// Detected format.
    pub format: ArchiveFormat,
    /// Entries in archive order.
    pub entries: Vec<ArchiveEntry>,
    /// Whether reading stopped early because the archive has more entries
    /// than the limit. The list then holds exactly `max_entries + 1`
    /// entries, enough for the batch validator to reject it.
    pub truncated: bool,
}

/// Tar stream with decompression limits applied to everything read from it,
/// headers and member data alike.
pub(super) type BoundedTar = tar::Archive<BoundedReader<Box<dyn Read>>>;

/// Reads the entry names, types, link targets and declared sizes of the
/// archive at `path`.
///
/// Compressed tar streams are decompressed to walk the headers, so the
/// decompression limits apply here too.
///
/// # Errors
///
/// - [`ArchiveError::UnsupportedFormat`] for unknown extensions
/// - [`ArchiveError::InvalidArchive`] for unreadable headers
/// - [`ArchiveError::DecompressionLimit`] if walking a tar stream trips a
///   limit
/// - [`ArchiveError::Io`] if the file cannot be opened
///
/// # Examples
///
/// ```no_run
/// use pathwarden_core::archive::inspect::read_entries;
/// use pathwarden_core::limits::SecurityLimits;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let listing = read_entries(Path::new("photos.zip"), &SecurityLimits::default())?;
/// for entry in &listing.entries {
///     println!("{} ({} bytes)", entry.name, entry.declared_size);
/// }
/// # Ok(())
/// # }
/// ```
pub fn read_entries(path: &Path, limits: &SecurityLimits) -> Result<ArchiveListing, ArchiveError> {
    let format = detect_format(path)?;
    let cap = limits.max_entries.saturating_add(1);

    let (entries, truncated) = match format {
        ArchiveFormat::Zip => read_zip_entries(path, cap, limits.max_path_length)?,
        _ => read_tar_entries(open_tar(path, format, limits)?, cap)?,
    };

    tracing::debug!(
        archive = %path.display(),
        format = %format,
        entries = entries.len(),
        truncated,
        "archive entries read"
    );
    Ok(ArchiveListing {
        format,
        entries,
        truncated,
    })
}

pub(super) fn open_tar(path: &Path, format: ArchiveFormat, limits: &SecurityLimits) -> Result<BoundedTar, ArchiveError> {
    let file = File::open(path)?;
    let counting = CountingReader::new(BufReader::new(file));
    let counter = counting.counter();

    let decoded: Box<dyn Read> = match format {
        ArchiveFormat::Tar => Box::new(counting),
        ArchiveFormat::TarGz => Box::new(GzDecoder::new(counting)),
        ArchiveFormat::TarBz2 => Box::new(BzDecoder::new(counting)),
        ArchiveFormat::TarXz => Box::new(XzDecoder::new(counting)),
        ArchiveFormat::TarZst => Box::new(zstd::stream::read::Decoder::new(counting)?),
        ArchiveFormat::Zip => {
            return Err(ArchiveError::UnsupportedFormat(format!(
                "{} is not a tar stream",
                path.display()
            )));
        }
    };

    Ok(tar::Archive::new(BoundedReader::new(
        decoded,
        CompressedSize::Counted(counter),
        limits,
    )))
}

/// Maps an I/O error from a tar walk, preferring a tripped limit over the
/// generic error tar may have wrapped it in.
pub(super) fn tar_failure(err: &io::Error, entry: &str, tripped: Option<&DecompressionLimit>) -> ArchiveError {
    match tripped.or_else(|| DecompressionLimit::from_io(err)) {
        Some(limit) => ArchiveError::DecompressionLimit {
            entry: entry.to_string(),
            limit: limit.clone(),
        },
        None => ArchiveError::InvalidArchive(format!("failed to read TAR entry: {err}")),
    }
}

fn read_tar_entries(mut archive: BoundedTar, cap: usize) -> Result<(Vec<ArchiveEntry>, bool), ArchiveError> {
    let mut entries = Vec::new();
    let mut truncated = false;

    let walked: io::Result<()> = (|| {
        for item in archive.entries()? {
            if entries.len() >= cap {
                truncated = true;
                break;
            }
            let entry = item?;
            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            let mut member = ArchiveEntry::new(name, entry.size()).with_kind(tar_kind(entry.header().entry_type()));
            if member.kind.is_link() {
                member.link_target = entry
                    .link_name_bytes()
                    .map(|target| String::from_utf8_lossy(&target).into_owned());
            }
            entries.push(member);
        }
        Ok(())
    })();

    if let Err(e) = walked {
        let last = entries.last().map_or("", |e: &ArchiveEntry| e.name.as_str());
        return Err(tar_failure(&e, last, archive.into_inner().tripped()));
    }
    Ok((entries, truncated))
}

fn tar_kind(kind: tar::EntryType) -> EntryKind {
    if kind.is_symlink() {
        EntryKind::Symlink
    } else if kind.is_hard_link() {
        EntryKind::Hardlink
    } else if kind.is_dir() {
        EntryKind::Directory
    } else if kind.is_file() || kind == tar::EntryType::Continuous || kind.is_gnu_sparse() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

/// `S_IFMT` and `S_IFLNK` from the unix mode stored in zip external
/// attributes.
const UNIX_FILE_TYPE_MASK: u32 = 0o170_000;
const UNIX_SYMLINK: u32 = 0o120_000;

fn read_zip_entries(path: &Path, cap: usize, max_link_len: usize) -> Result<(Vec<ArchiveEntry>, bool), ArchiveError> {
    let file = File::open(path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| ArchiveError::InvalidArchive(format!("failed to open ZIP archive: {e}")))?;

    let total = archive.len();
    let take = total.min(cap);
    let mut entries = Vec::with_capacity(take);

    for i in 0..take {
        let mut entry = {
            let member = archive
                .by_index_raw(i)
                .map_err(|e| ArchiveError::InvalidArchive(format!("failed to read ZIP entry: {e}")))?;
            let kind = if member.is_dir() {
                EntryKind::Directory
            } else if member
                .unix_mode()
                .is_some_and(|mode| mode & UNIX_FILE_TYPE_MASK == UNIX_SYMLINK)
            {
                EntryKind::Symlink
            } else {
                EntryKind::File
            };
            let name = String::from_utf8_lossy(member.name_raw()).into_owned();
            ArchiveEntry::new(name, member.size())
                .with_compressed_size(member.compressed_size())
                .with_kind(kind)
        };
        if entry.kind == EntryKind::Symlink {
            entry.link_target = Some(read_zip_link(&mut archive, i, max_link_len)?);
        }
        entries.push(entry);
    }

    Ok((entries, total > take))
}

/// Reads a zip symlink's target, which is stored as the member's data.
///
/// At most `max_len + 1` bytes are read so an oversized target is still
/// caught by the path length check.
fn read_zip_link(
    archive: &mut zip::ZipArchive<BufReader<File>>,
    index: usize,
    max_len: usize,
) -> Result<String, ArchiveError> {
    let member = archive
        .by_index(index)
        .map_err(|e| ArchiveError::InvalidArchive(format!("failed to read ZIP symlink: {e}")))?;
    let mut target = Vec::new();
    member.take(max_len as u64 + 1).read_to_end(&mut target)?;
    Ok(String::from_utf8_lossy(&target).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_utils::RawMember;
    use crate::test_utils::create_raw_tar;
    use crate::test_utils::create_test_tar;
    use crate::test_utils::create_test_tar_gz;
    use crate::test_utils::create_test_zip;
    use crate::test_utils::create_zip_with_symlink;
    use crate::test_utils::raw_tar_with_name;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_read_tar_entries() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(
            &temp,
            "a.tar",
            &create_test_tar(vec![("one.txt", b"1"), ("dir/two.txt", b"22")]),
        );

        let listing = read_entries(&path, &SecurityLimits::default()).unwrap();
        assert_eq!(listing.format, ArchiveFormat::Tar);
        assert_eq!(
            listing.entries,
            vec![ArchiveEntry::new("one.txt", 1), ArchiveEntry::new("dir/two.txt", 2)]
        );
        assert!(!listing.truncated);
    }

    #[test]
    fn test_read_tar_gz_entries() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(&temp, "a.tar.gz", &create_test_tar_gz(vec![("x.txt", b"hello")]));
        let listing = read_entries(&path, &SecurityLimits::default()).unwrap();
        assert_eq!(listing.format, ArchiveFormat::TarGz);
        assert_eq!(listing.entries[0].name, "x.txt");
    }

    #[test]
    fn test_read_zip_entries_with_sizes() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(&temp, "a.zip", &create_test_zip(vec![("docs/readme.txt", b"hello")]));
        let listing = read_entries(&path, &SecurityLimits::default()).unwrap();
        assert_eq!(listing.entries[0].name, "docs/readme.txt");
        assert_eq!(listing.entries[0].declared_size, 5);
        assert_eq!(listing.entries[0].compressed_size, Some(5));
    }

    #[test]
    fn test_hostile_tar_name_preserved() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(&temp, "evil.tar", &raw_tar_with_name("../../etc/passwd", b"x"));
        let listing = read_entries(&path, &SecurityLimits::default()).unwrap();
        assert_eq!(listing.entries[0].name, "../../etc/passwd");
    }

    #[test]
    fn test_tar_link_entries_carry_targets() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(
            &temp,
            "links.tar",
            &create_raw_tar(&[
                RawMember::Dir("conf"),
                RawMember::Symlink("evil", "/etc"),
                RawMember::Hardlink("copy", "conf/app.toml"),
                RawMember::File("evil/cron.d/job", b"x"),
            ]),
        );

        let entries = read_entries(&path, &SecurityLimits::default()).unwrap().entries;
        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            [EntryKind::Directory, EntryKind::Symlink, EntryKind::Hardlink, EntryKind::File]
        );
        assert_eq!(entries[1].link_target.as_deref(), Some("/etc"));
        assert_eq!(entries[2].link_target.as_deref(), Some("conf/app.toml"));
        assert_eq!(entries[3].link_target, None);
    }

    #[test]
    fn test_zip_symlink_target_read() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(&temp, "link.zip", &create_zip_with_symlink("evil", "../../etc"));

        let entries = read_entries(&path, &SecurityLimits::default()).unwrap().entries;
        assert_eq!(entries[0].kind, EntryKind::Symlink);
        assert_eq!(entries[0].link_target.as_deref(), Some("../../etc"));
    }

    #[test]
    fn test_listing_stops_one_past_limit() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let files: Vec<(String, Vec<u8>)> = (0..10).map(|i| (format!("f{i}"), vec![b'x'])).collect();
        let refs: Vec<(&str, &[u8])> = files.iter().map(|(n, d)| (n.as_str(), d.as_slice())).collect();
        let tar_path = write(&temp, "many.tar", &create_test_tar(refs.clone()));
        let zip_path = write(&temp, "many.zip", &create_test_zip(refs));

        let limits = SecurityLimits {
            max_entries: 3,
            ..SecurityLimits::default()
        };
        for path in [tar_path, zip_path] {
            let listing = read_entries(&path, &limits).unwrap();
            assert_eq!(listing.entries.len(), 4);
            assert!(listing.truncated);
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(&temp, "a.rar", b"Rar!");
        assert!(matches!(
            read_entries(&path, &SecurityLimits::default()),
            Err(ArchiveError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_corrupt_zip() {
        let temp = TempDir::new().expect("failed to create temp dir");
        let path = write(&temp, "bad.zip", b"definitely not a zip");
        assert!(matches!(
            read_entries(&path, &SecurityLimits::default()),
            Err(ArchiveError::InvalidArchive(_))
        ));
    }
}
