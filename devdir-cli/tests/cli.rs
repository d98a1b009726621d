//! End-to-end CLI behavior that needs no network access.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn devdir() -> Command {
    Command::cargo_bin("devdir").unwrap()
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yaml");
    let snapshot_dir = dir.path().join("snapshots");
    std::fs::write(
        &path,
        format!(
            "directory: acme/directory\nsnapshot_dir: {}\n",
            snapshot_dir.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    devdir()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("stats"));
}

#[test]
fn run_requires_a_config_file() {
    let tmp = TempDir::new().unwrap();
    devdir()
        .arg("run")
        .arg("--config")
        .arg(tmp.path().join("missing.yaml"))
        .env("GITHUB_TOKEN", "t")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn run_requires_github_token() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp);
    devdir()
        .arg("run")
        .arg("--config")
        .arg(&config)
        .env_remove("GITHUB_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn stats_without_snapshot_points_at_run() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp);
    devdir()
        .arg("stats")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no statistics snapshot"));
}

#[test]
fn stats_json_prints_the_snapshot() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp);
    let snapshot_dir = tmp.path().join("snapshots");
    std::fs::create_dir_all(&snapshot_dir).unwrap();
    std::fs::write(
        snapshot_dir.join("statistics.json"),
        r#"{
  "rewards": { "notAssigned": 1000.0, "assigned": 500.0, "completed": 200.0, "total": 1700.0 },
  "tasks": { "notAssigned": 1, "assigned": 1, "completed": 1, "total": 3 }
}"#,
    )
    .unwrap();

    devdir()
        .arg("stats")
        .arg("--config")
        .arg(&config)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("notAssigned"))
        .stdout(predicate::str::contains("1700"));
}

#[test]
fn stats_table_lists_all_buckets() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(&tmp);
    let snapshot_dir = tmp.path().join("snapshots");
    std::fs::create_dir_all(&snapshot_dir).unwrap();
    std::fs::write(
        snapshot_dir.join("statistics.json"),
        r#"{
  "rewards": { "notAssigned": 1000.0, "assigned": 500.0, "completed": 200.0, "total": 1700.0 },
  "tasks": { "notAssigned": 1, "assigned": 1, "completed": 1, "total": 3 }
}"#,
    )
    .unwrap();

    devdir()
        .arg("stats")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("not assigned"))
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("1700.00"));
}
