//! Integration tests for pathwarden-cli.
//!
//! Note: Tests use `unwrap`/`expect` which is acceptable in test code.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use pathwarden_core::test_utils::RawMember;
use pathwarden_core::test_utils::create_raw_tar;
use pathwarden_core::test_utils::create_test_tar_gz;
use pathwarden_core::test_utils::create_test_zip;
use pathwarden_core::test_utils::raw_tar_with_name;
use pathwarden_core::test_utils::write_fixture;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch area with a working directory and a config file path.
struct Workspace {
    _temp: TempDir,
    root: PathBuf,
    work: PathBuf,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = temp.path().canonicalize().unwrap();
        let work = root.join("work");
        fs::create_dir_all(&work).unwrap();
        Self {
            config: root.join("config.json"),
            _temp: temp,
            root,
            work,
        }
    }

    fn with_config(json: &str) -> Self {
        let ws = Self::new();
        fs::write(&ws.config, json).unwrap();
        ws
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("pathwarden");
        cmd.current_dir(&self.work)
            .env_remove("PATHWARDEN_CONFIG")
            .env("PATHWARDEN_LOG", "off")
            .arg("--config")
            .arg(&self.config);
        cmd
    }
}

fn json_stdout(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("invalid JSON output")
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("pathwarden")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pathwarden"));
}

#[test]
fn test_help_flag() {
    cargo_bin_cmd!("pathwarden")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Validate a path"));
}

#[test]
fn test_status_defaults_to_strict() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Mode: strict"));
}

#[test]
fn test_status_json() {
    let ws = Workspace::with_config(r#"{"security": {"mode": "unrestricted"}}"#);
    let output = ws.cmd().args(["--json", "status"]).output().unwrap();
    assert!(output.status.success());

    let json = json_stdout(&output);
    assert_eq!(json["operation"], "status");
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["mode"], "unrestricted");
    assert_eq!(json["data"]["deny_list_active"], true);
}

#[test]
fn test_check_inside_working_directory() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["check", "./notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path_str(&ws.work.join("notes.txt"))));
}

#[test]
fn test_check_outside_working_directory_is_denied() {
    let ws = Workspace::new();
    let outside = ws.root.join("other/file.txt");

    ws.cmd()
        .args(["check", path_str(&outside)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ACCESS_DENIED"))
        .stderr(predicate::str::contains("HINT"))
        .stderr(predicate::str::contains(path_str(&ws.root)).not());
}

#[test]
fn test_check_denial_json_envelope() {
    let ws = Workspace::new();
    let output = ws.cmd().args(["--json", "check", "../escape.txt"]).output().unwrap();
    assert!(!output.status.success());

    let json = json_stdout(&output);
    assert_eq!(json["operation"], "check");
    assert_eq!(json["status"], "error");
    assert!(json["error"].as_str().unwrap().contains("ACCESS_DENIED"));
}

#[test]
fn test_check_must_exist() {
    let ws = Workspace::new();
    fs::write(ws.work.join("present.txt"), "x").unwrap();

    ws.cmd().args(["check", "--must-exist", "present.txt"]).assert().success();
    ws.cmd()
        .args(["check", "--must-exist", "missing.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_sandboxed_without_allow_list_is_validation_error() {
    let ws = Workspace::with_config(r#"{"security": {"mode": "sandboxed"}}"#);
    ws.cmd()
        .args(["check", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VALIDATION_ERROR"));
}

#[test]
fn test_allow_list_lifecycle() {
    let ws = Workspace::with_config(r#"{"security": {"mode": "sandboxed"}, "ui": {"theme": "dark"}}"#);
    let docs = ws.root.join("Documents");
    fs::create_dir_all(&docs).unwrap();
    let docs_str = path_str(&docs);
    let inside = docs.join("report.pdf");

    ws.cmd().args(["allow", "add", docs_str]).assert().success();

    ws.cmd()
        .args(["allow", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(docs_str));

    ws.cmd().args(["allow", "test", path_str(&inside)]).assert().success();
    ws.cmd().args(["check", path_str(&inside)]).assert().success();

    // unrelated settings survive the rewrite
    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&ws.config).unwrap()).unwrap();
    assert_eq!(saved["ui"]["theme"], "dark");
    assert_eq!(saved["security"]["allowed_directories"][0], docs_str);

    ws.cmd().args(["allow", "remove", docs_str]).assert().success();
    ws.cmd().args(["allow", "test", path_str(&inside)]).assert().failure();
}

#[test]
fn test_allow_add_duplicate_rejected() {
    let ws = Workspace::new();
    let dir = path_str(&ws.work);

    ws.cmd().args(["allow", "add", dir]).assert().success();
    ws.cmd()
        .args(["allow", "add", &format!("{dir}/")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already allowed"));
}

#[test]
fn test_allow_add_missing_directory() {
    let ws = Workspace::new();
    let missing = ws.root.join("not/yet");

    ws.cmd()
        .args(["allow", "add", path_str(&missing)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VALIDATION_ERROR"));

    ws.cmd()
        .args(["allow", "add", "--create", path_str(&missing)])
        .assert()
        .success();
    assert!(missing.is_dir());
}

#[test]
fn test_archive_check_safe_zip() {
    let ws = Workspace::new();
    let archive = write_fixture(
        &ws.work,
        "docs.zip",
        &create_test_zip(vec![("docs/readme.txt", b"hello"), ("docs/guide.md", b"# guide")]),
    );

    ws.cmd()
        .args(["archive", "check", "--deep", path_str(&archive), path_str(&ws.work)])
        .assert()
        .success()
        .stdout(predicate::str::contains("SAFE"));
}

#[test]
fn test_archive_check_reports_traversal() {
    let ws = Workspace::new();
    let archive = write_fixture(&ws.work, "evil.tar", &raw_tar_with_name("../../etc/passwd", b"root"));

    ws.cmd()
        .args(["archive", "check", path_str(&archive), path_str(&ws.work)])
        .assert()
        .failure()
        .stdout(predicate::str::contains("UNSAFE"))
        .stdout(predicate::str::contains("../../etc/passwd"));
}

#[test]
fn test_archive_check_json_lists_every_offender() {
    let ws = Workspace::new();
    let archive = write_fixture(
        &ws.work,
        "mixed.zip",
        &create_test_zip(vec![("ok.txt", b"1"), ("../a.txt", b"2"), ("/abs.txt", b"3")]),
    );

    let output = ws
        .cmd()
        .args(["--json", "archive", "check", path_str(&archive), path_str(&ws.work)])
        .output()
        .unwrap();
    assert!(!output.status.success());

    let json = json_stdout(&output);
    assert_eq!(json["operation"], "archive-check");
    assert_eq!(json["status"], "error");
    assert_eq!(json["data"]["valid"], 1);
    assert_eq!(json["data"]["rejected"].as_array().unwrap().len(), 2);
}

#[test]
fn test_archive_check_decompression_bomb() {
    let ws = Workspace::new();
    let zeros = vec![0u8; 8 * 1024 * 1024];
    let archive = write_fixture(&ws.work, "bomb.tar.gz", &create_test_tar_gz(vec![("zeros.bin", zeros.as_slice())]));

    ws.cmd()
        .args(["archive", "check", "--deep", path_str(&archive), path_str(&ws.work)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decompression bomb"));
}

#[test]
fn test_archive_check_unsupported_format() {
    let ws = Workspace::new();
    let archive = write_fixture(&ws.work, "notes.rar", b"Rar!");

    ws.cmd()
        .args(["archive", "check", path_str(&archive), path_str(&ws.work)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn test_archive_check_outside_working_directory_denied() {
    let ws = Workspace::new();
    let archive = write_fixture(&ws.root, "elsewhere.zip", &create_test_zip(vec![("a.txt", b"a")]));

    ws.cmd()
        .args(["archive", "check", path_str(&archive), path_str(&ws.work)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ACCESS_DENIED"))
        .stderr(predicate::str::contains(path_str(&ws.root)).not());
}

#[test]
fn test_archive_check_target_outside_working_directory_denied() {
    let ws = Workspace::new();
    let archive = write_fixture(&ws.work, "docs.zip", &create_test_zip(vec![("a.txt", b"a")]));

    ws.cmd()
        .args(["archive", "check", path_str(&archive), path_str(&ws.root.join("out"))])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ACCESS_DENIED"));
}

#[test]
fn test_archive_check_reports_symlink_slip() {
    let ws = Workspace::new();
    let archive = write_fixture(
        &ws.work,
        "slip.tar",
        &create_raw_tar(&[
            RawMember::Symlink("evil", "/etc"),
            RawMember::File("evil/cron.d/x", b"* * * * * root sh"),
        ]),
    );

    ws.cmd()
        .args(["archive", "check", path_str(&archive), "out"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("UNSAFE"))
        .stdout(predicate::str::contains("evil/cron.d/x"));
}

#[test]
fn test_completion_bash() {
    cargo_bin_cmd!("pathwarden")
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pathwarden"));
}

#[test]
fn test_invalid_config_reports_config_error() {
    let ws = Workspace::with_config("{ not json");
    ws.cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_ERROR"));
}
