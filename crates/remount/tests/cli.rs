//! Tests for the `remount` binary surface.

use assert_cmd::Command;
use predicates::prelude::*;

fn remount() -> Command {
    Command::cargo_bin("remount").unwrap()
}

#[test]
fn help_lists_options() {
    remount()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fstab"))
        .stdout(predicate::str::contains("--reboot"))
        .stdout(predicate::str::contains("clean-scratch"));
}

#[test]
fn two_fstabs_are_a_usage_error() {
    remount()
        .args(["-T", "/odm/etc/fstab.a", "-T", "/odm/etc/fstab.b"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn clean_scratch_removes_stale_overlays() {
    let scratch = tempfile::tempdir().unwrap();
    let stale = scratch.path().join("odm");
    std::fs::create_dir_all(stale.join("upper")).unwrap();

    remount()
        .arg("clean-scratch")
        .env("REMOUNT_SCRATCH_DIR", scratch.path())
        .assert()
        .success();

    assert!(!stale.exists());
}
