//! Integration tests for pathwarden-core.
//!
//! These tests drive the public facade end to end against real temporary
//! directories: mode selection from a config document, allow-list
//! persistence, symlink handling and archive checks.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pathwarden_core::DenialReason;
use pathwarden_core::OpenIntent;
use pathwarden_core::PathWarden;
use pathwarden_core::SecurityMode;
use pathwarden_core::ValidationRequest;
use pathwarden_core::allowlist::AddOptions;
use pathwarden_core::archive::ArchiveEntry;
use pathwarden_core::archive::ArchiveError;
use pathwarden_core::archive::RejectionReason;
use pathwarden_core::archive::inspect::read_entries;
use pathwarden_core::config::ConfigDocument;
use pathwarden_core::path::ExpansionContext;
use pathwarden_core::test_utils::RawMember;
use pathwarden_core::test_utils::create_raw_tar;
use pathwarden_core::test_utils::create_test_zip;
use pathwarden_core::test_utils::raw_tar_with_name;
use pathwarden_core::test_utils::write_fixture;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn real_temp() -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("failed to create temp dir");
    let root = temp.path().canonicalize().expect("canonicalize temp dir");
    (temp, root)
}

fn warden(mode: SecurityMode, allowed: &[&Path], cwd: &Path) -> PathWarden {
    let mut doc = ConfigDocument::default();
    doc.security.mode = mode;
    doc.security.allowed_directories = allowed.iter().map(|p| p.display().to_string()).collect();
    PathWarden::from_document(&doc, None, cwd, ExpansionContext::isolated()).unwrap()
}

#[test]
fn test_strict_scenario() {
    let (_temp, root) = real_temp();
    let proj = root.join("home/u/proj");
    let other = root.join("home/u/other");
    fs::create_dir_all(&proj).unwrap();
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("file.txt"), "x").unwrap();

    let warden = warden(SecurityMode::Strict, &[], &proj);

    let err = warden
        .validate_path(other.join("file.txt").to_str().unwrap())
        .unwrap_err();
    assert!(err.is_access_denied());

    let real = warden.validate_path("./notes.txt").unwrap();
    assert_eq!(real.as_path(), proj.join("notes.txt"));
}

#[test]
fn test_sandboxed_scenario_traversal_out_of_root() {
    let (_temp, root) = real_temp();
    let documents = root.join("home/u/Documents");
    fs::create_dir_all(&documents).unwrap();

    let warden = warden(SecurityMode::Sandboxed, &[&documents], &root);
    let input = format!("{}/../../etc/shadow", documents.display());

    let err = warden.validate_path(&input).unwrap_err();
    assert!(err.is_access_denied());
    assert_eq!(err.denial_reason(), Some(&DenialReason::OutsideRoots));
}

#[test]
fn test_sandboxed_scenario_empty_allow_list() {
    let (_temp, root) = real_temp();
    let warden = warden(SecurityMode::Sandboxed, &[], &root);

    for input in ["/etc/shadow", "./anything", "."] {
        let err = warden.validate_path(input).unwrap_err();
        assert!(err.is_validation(), "{input}: {err}");
        assert!(!err.is_access_denied());
    }
}

#[test]
fn test_traversal_denied_in_every_bounded_mode() {
    let (_temp, root) = real_temp();
    let work = root.join("work");
    fs::create_dir_all(&work).unwrap();

    for mode in [SecurityMode::Strict, SecurityMode::Sandboxed] {
        let warden = warden(mode, &[&work], &work);
        let err = warden.validate_path("../../../../../../etc/hosts").unwrap_err();
        assert!(err.is_access_denied(), "{mode}: {err}");
    }
}

#[test]
fn test_unrestricted_allows_ordinary_paths_and_denies_system_dirs() {
    let (_temp, root) = real_temp();
    let warden = warden(SecurityMode::Unrestricted, &[], &root);

    let real = warden.validate_path("../elsewhere/file.txt").unwrap();
    assert_eq!(real.as_path(), root.parent().unwrap().join("elsewhere/file.txt"));

    #[cfg(unix)]
    {
        let err = warden.validate_path("/etc/passwd").unwrap_err();
        assert!(matches!(err.denial_reason(), Some(DenialReason::SystemPath { .. })));
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_rejected_in_sandbox() {
    let (_temp, root) = real_temp();
    let inbox = root.join("inbox");
    let secrets = root.join("secrets");
    fs::create_dir_all(&inbox).unwrap();
    fs::create_dir_all(&secrets).unwrap();
    fs::write(secrets.join("key.pem"), "private").unwrap();
    std::os::unix::fs::symlink(&secrets, inbox.join("shortcut")).unwrap();

    let warden = warden(SecurityMode::Sandboxed, &[&inbox], &root);
    let input = inbox.join("shortcut/key.pem");
    let err = warden.validate_path(input.to_str().unwrap()).unwrap_err();

    assert!(err.is_access_denied());
    match err.denial_reason() {
        Some(DenialReason::SymlinkEscape { real_path }) => {
            assert_eq!(real_path, &secrets.join("key.pem"));
        }
        other => panic!("expected symlink escape, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn test_symlink_inside_root_is_followed() {
    let (_temp, root) = real_temp();
    let inbox = root.join("inbox");
    fs::create_dir_all(inbox.join("sorted")).unwrap();
    std::os::unix::fs::symlink(inbox.join("sorted"), inbox.join("latest")).unwrap();

    let warden = warden(SecurityMode::Strict, &[], &inbox);
    let real = warden.validate_path("latest/a.txt").unwrap();
    assert_eq!(real.as_path(), inbox.join("sorted/a.txt"));
}

#[test]
fn test_validation_is_idempotent() {
    let (_temp, root) = real_temp();
    fs::create_dir_all(root.join("a/b")).unwrap();
    let warden = warden(SecurityMode::Strict, &[], &root);

    let first = warden.validate_path("a/./b/../b/file.txt").unwrap();
    let second = warden.validate_path(first.as_path().to_str().unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_allow_list_round_trip_through_config_file() {
    let (_temp, root) = real_temp();
    let config = root.join("config.json");
    let project = root.join("project");
    fs::create_dir_all(&project).unwrap();

    let mut doc = ConfigDocument::default();
    doc.security.mode = SecurityMode::Sandboxed;
    let warden = PathWarden::from_document(&doc, Some(config.clone()), &root, ExpansionContext::isolated()).unwrap();
    let dir = project.to_str().unwrap();

    warden.allow_list().add(dir, AddOptions::default()).unwrap();
    assert!(warden.allow_list().is_path_allowed(dir).unwrap().is_some());
    assert!(warden.validate_path(&format!("{dir}/notes.md")).is_ok());

    let reloaded = ConfigDocument::load(&config).unwrap();
    assert_eq!(reloaded.security.allowed_directories, vec![dir.to_string()]);

    warden.allow_list().remove(dir).unwrap();
    assert!(warden.allow_list().is_path_allowed(dir).unwrap().is_none());
    assert!(warden.validate_path(&format!("{dir}/notes.md")).unwrap_err().is_validation());
}

#[test]
fn test_require_exists_and_write_flags() {
    let (_temp, root) = real_temp();
    fs::write(root.join("present.txt"), "x").unwrap();
    let warden = warden(SecurityMode::Strict, &[], &root);

    assert!(
        warden
            .validate(&ValidationRequest::new("present.txt").require_exists(true))
            .unwrap()
            .existed()
    );

    let err = warden
        .validate(&ValidationRequest::new("missing.txt").require_exists(true))
        .unwrap_err();
    assert_eq!(err.denial_reason(), Some(&DenialReason::NotFound));

    assert!(
        warden
            .validate(&ValidationRequest::new("new/dir/out.txt").check_write(true))
            .is_ok()
    );
}

#[test]
fn test_guarded_open_read_and_create() {
    let (_temp, root) = real_temp();
    fs::write(root.join("in.txt"), "hello").unwrap();
    let warden = warden(SecurityMode::Strict, &[], &root);

    let (real, file) = warden.open("in.txt", OpenIntent::Read).unwrap();
    assert_eq!(real.as_path(), root.join("in.txt"));
    assert_eq!(std::io::read_to_string(file).unwrap(), "hello");

    let (created, _file) = warden.open("out.txt", OpenIntent::CreateNew).unwrap();
    assert!(created.as_path().exists());

    assert!(warden.open("../outside.txt", OpenIntent::CreateNew).unwrap_err().is_access_denied());
}

#[test]
fn test_archive_entry_scenarios() {
    let (_temp, root) = real_temp();
    let target = root.join("safe/target");
    fs::create_dir_all(&target).unwrap();
    let warden = warden(SecurityMode::Strict, &[], &root);
    let validator = warden.archive_validator();

    assert!(validator.validate_entry("../../etc/passwd", &target).is_err());
    let ok = validator.validate_entry("docs/readme.txt", &target).unwrap();
    assert_eq!(ok.as_path(), target.join("docs/readme.txt"));
}

#[test]
fn test_entry_count_ceiling_short_circuits() {
    let (_temp, root) = real_temp();
    let warden = warden(SecurityMode::Strict, &[], &root);
    let limits = pathwarden_core::SecurityLimits {
        max_entries: 5,
        ..warden.limits().clone()
    };
    let validator = pathwarden_core::ArchiveValidator::new(limits);

    // every name is hostile; none of them must be evaluated
    let entries: Vec<ArchiveEntry> = (0..6).map(|i| ArchiveEntry::new(format!("../evil{i}"), 1)).collect();
    let err = validator.validate_entries(&entries, &root).unwrap_err();
    assert!(matches!(err, ArchiveError::TooManyEntries { count: 6, max: 5 }));
}

#[test]
fn test_inspected_archive_collects_every_offender() {
    let (_temp, root) = real_temp();
    let target = root.join("out");
    fs::create_dir_all(&target).unwrap();

    let zip_path = write_fixture(
        &root,
        "mixed.zip",
        &create_test_zip(vec![
            ("ok/one.txt", b"1"),
            ("../escape.txt", b"2"),
            ("ok/two.txt", b"3"),
            ("/etc/cron.d/job", b"4"),
        ]),
    );
    let tar_path = write_fixture(&root, "evil.tar", &raw_tar_with_name("../../etc/passwd", b"x"));

    let warden = warden(SecurityMode::Strict, &[], &root);
    let validator = warden.archive_validator();

    let listing = read_entries(&zip_path, warden.limits()).unwrap();
    let outcome = validator.validate_entries(&listing.entries, &target).unwrap();
    assert_eq!(outcome.valid.len(), 2);
    let rejected: Vec<&str> = outcome.invalid_entries.iter().map(|r| r.entry.as_str()).collect();
    assert_eq!(rejected, ["../escape.txt", "/etc/cron.d/job"]);

    let listing = read_entries(&tar_path, warden.limits()).unwrap();
    let outcome = validator.validate_entries(&listing.entries, &target).unwrap();
    assert!(outcome.valid.is_empty());
    assert!(matches!(
        outcome.invalid_entries[0].reason,
        RejectionReason::BlockedPattern { .. }
    ));
}

#[test]
fn test_inspected_tar_symlink_slip_is_reported() {
    let (_temp, root) = real_temp();
    let target = root.join("out");
    fs::create_dir_all(&target).unwrap();
    let tar_path = write_fixture(
        &root,
        "slip.tar",
        &create_raw_tar(&[
            RawMember::Symlink("evil", "/etc"),
            RawMember::File("evil/cron.d/x", b"* * * * * root sh"),
            RawMember::File("notes.txt", b"hello"),
        ]),
    );

    let warden = warden(SecurityMode::Strict, &[], &root);
    let listing = read_entries(&tar_path, warden.limits()).unwrap();
    let outcome = warden
        .archive_validator()
        .validate_entries(&listing.entries, &target)
        .unwrap();

    assert!(!outcome.is_clean());
    let rejected: Vec<&str> = outcome.invalid_entries.iter().map(|r| r.entry.as_str()).collect();
    assert_eq!(rejected, ["evil", "evil/cron.d/x"]);
    assert_eq!(outcome.valid.len(), 1);
}
