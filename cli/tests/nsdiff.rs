use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn snapshot(root: &Path, node: &str, genesis: &str) {
    let dir = root.join(node).join("data").join(node);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("pool_genesis"), genesis).unwrap();
    fs::write(dir.join(format!("{node}_info.json")), r#"{"view": 3, "started": 17}"#).unwrap();
}

fn nsdiff() -> Command {
    Command::cargo_bin("nsdiff").unwrap()
}

#[test]
fn test_identical_plain_snapshots() {
    let tmp = TempDir::new().unwrap();
    snapshot(tmp.path(), "Alpha", "genesis\n");
    snapshot(tmp.path(), "Beta", "genesis\n");

    nsdiff()
        .arg(tmp.path().join("Alpha"))
        .arg(tmp.path().join("Beta"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Identical state!"));
}

#[test]
fn test_differing_snapshots_exit_one() {
    let tmp = TempDir::new().unwrap();
    snapshot(tmp.path(), "Alpha", "genesis\n");
    snapshot(tmp.path(), "Beta", "other\n");

    nsdiff()
        .arg(tmp.path().join("Alpha"))
        .arg(tmp.path().join("Beta"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("-genesis"))
        .stderr(predicate::str::contains("State differs! (diff exit status 1)"));
}

#[test]
fn test_missing_inputs_reported_together() {
    let tmp = TempDir::new().unwrap();

    nsdiff()
        .arg(tmp.path().join("nope1"))
        .arg(tmp.path().join("nope2"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("state1").and(predicate::str::contains("state2")));
}

#[test]
fn test_unrecognised_archive() {
    let tmp = TempDir::new().unwrap();
    snapshot(tmp.path(), "Alpha", "genesis\n");
    let bogus = tmp.path().join("Beta.zip");
    fs::write(&bogus, b"definitely not an archive").unwrap();

    nsdiff()
        .arg(tmp.path().join("Alpha"))
        .arg(&bogus)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Archive error"));
}

#[test]
fn test_cleanup_no_prints_kept_dirs() {
    let tmp = TempDir::new().unwrap();
    snapshot(tmp.path(), "Alpha", "genesis\n");
    snapshot(tmp.path(), "Beta", "genesis\n");

    let output = nsdiff()
        .arg(tmp.path().join("Alpha"))
        .arg(tmp.path().join("Beta"))
        .args(["--cleanup", "no"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let kept: Vec<&str> = stdout
        .lines()
        .filter_map(|l| l.strip_prefix("Temporary directory kept: "))
        .collect();
    assert_eq!(kept.len(), 2);
    for dir in kept {
        assert!(Path::new(dir).join("data/node/node_info.json").is_file());
        fs::remove_dir_all(dir).unwrap();
    }
}
