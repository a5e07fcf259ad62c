//! Smoke tests -- verify the binary runs and the subcommands work end to end.

use assert_cmd::Command;
use predicates::prelude::*;

const LOG: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<log xes.version="1.0">
  <trace>
    <string key="rejected" value="false"/>
    <event><string key="concept:name" value="A"/><date key="time:timestamp" value="2020-01-01T00:00:00Z"/></event>
    <event><string key="concept:name" value="B"/><date key="time:timestamp" value="2020-01-01T00:00:10Z"/></event>
  </trace>
  <trace>
    <string key="rejected" value="false"/>
    <event><string key="concept:name" value="A"/><date key="time:timestamp" value="2020-01-01T00:00:00Z"/></event>
    <event><string key="concept:name" value="B"/><date key="time:timestamp" value="2020-01-01T00:00:20Z"/></event>
  </trace>
  <trace>
    <string key="rejected" value="false"/>
    <event><string key="concept:name" value="A"/><date key="time:timestamp" value="2020-01-01T00:00:00Z"/></event>
    <event><string key="concept:name" value="B"/><date key="time:timestamp" value="2020-01-01T00:00:30Z"/></event>
  </trace>
  <trace>
    <string key="rejected" value="true"/>
    <event><string key="concept:name" value="A"/><date key="time:timestamp" value="2020-01-01T00:00:00Z"/></event>
    <event><string key="concept:name" value="B"/><date key="time:timestamp" value="2020-01-01T00:00:35Z"/></event>
  </trace>
</log>"#;

fn write_log(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("loans.xes");
    std::fs::write(&path, LOG).unwrap();
    path
}

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("tracelapse").unwrap();
    cmd.env_remove("TRACELAPSE_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Transition-timing anomaly detection"));
}

#[test]
fn test_cli_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tracelapse"));
}

#[test]
fn test_analyze_reports_violation() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);

    cmd()
        .current_dir(dir.path())
        .args(["analyze", "--min-support", "1", "--threshold", "10"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Pattern (A, B): Mean = 20.0000, Std = 8.1650, Count = 3",
        ))
        .stdout(predicate::str::contains("Duration: 35.0000, Deviation: 15.0000"))
        .stdout(predicate::str::contains(
            "Pattern (A, B): Mean_L1 = 20.0000, Mean_L2 = 35.0000",
        ));
}

#[test]
fn test_analyze_loose_threshold_has_no_violations() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);

    cmd()
        .current_dir(dir.path())
        .args(["analyze", "--min-support", "1", "--threshold", "20"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("(no violations)"))
        .stdout(predicate::str::contains("Deviation: 15.0000").not());
}

#[test]
fn test_analyze_json_and_out_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);
    let out = dir.path().join("reports");

    let output = cmd()
        .current_dir(dir.path())
        .args(["analyze", "--min-support", "1", "--json", "--out-dir"])
        .arg(&out)
        .arg(&log)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["baseline_traces"], 3);
    assert_eq!(json["target_traces"], 1);
    assert_eq!(json["baseline_stats"]["(A, B)"]["count"], 3);
    assert_eq!(json["deviations"]["(A, B)"][0]["classification"], "Violated");

    let drift = std::fs::read_to_string(out.join("pattern_drift.txt")).unwrap();
    assert_eq!(drift, "Pattern (A, B): Mean_L1 = 20.0000, Mean_L2 = 35.0000\n");
    assert!(out.join("occurrence_deviations.txt").exists());
}

#[test]
fn test_default_min_support_filters_small_log() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);

    cmd()
        .current_dir(dir.path())
        .arg("analyze")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("(no patterns)"));
}

#[test]
fn test_config_file_selects_std_dev_policy() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);
    let config = dir.path().join("custom.toml");
    std::fs::write(
        &config,
        "[patterns]\nmin_support = 1\n\n[threshold]\nmode = \"std_dev_multiple\"\nmultiplier = 1.0\n",
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("analyze")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 x baseline std dev"))
        .stdout(predicate::str::contains("Duration: 35.0000"));
}

#[test]
fn test_summary_subcommand() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);

    cmd()
        .current_dir(dir.path())
        .arg("summary")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Baseline traces      : 3"))
        .stdout(predicate::str::contains("Target traces        : 1"));
}

#[test]
fn test_patterns_subcommand() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);

    cmd()
        .current_dir(dir.path())
        .args(["patterns", "--min-support", "4"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pattern (A, B): Mean = 23.7500"));
}

#[test]
fn test_missing_partition_attribute_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.xes");
    std::fs::write(
        &path,
        r#"<log><trace>
  <event><string key="concept:name" value="A"/><date key="time:timestamp" value="2020-01-01T00:00:00Z"/></event>
</trace></log>"#,
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("analyze")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing attribute `rejected` on trace 0"));
}

#[test]
fn test_unreadable_log_fails() {
    cmd()
        .args(["analyze", "/nonexistent/log.xes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load event log"));
}

#[test]
fn test_broken_env_config_warns_and_falls_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[patterns]\nmin_support = \"five\"\n").unwrap();

    cmd()
        .current_dir(dir.path())
        .env("TRACELAPSE_CONFIG", &bad)
        .args(["analyze", "--min-support", "1"])
        .arg(&log)
        .assert()
        .success()
        .stderr(predicate::str::contains("could not be loaded"))
        .stderr(predicate::str::contains("bad.toml"))
        .stdout(predicate::str::contains("Pattern (A, B): Mean = 20.0000"));
}

#[test]
fn test_broken_local_config_warns() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);
    std::fs::write(dir.path().join("tracelapse.toml"), "[threshold\n").unwrap();

    cmd()
        .current_dir(dir.path())
        .arg("summary")
        .arg(&log)
        .assert()
        .success()
        .stderr(predicate::str::contains("config file exists but could not be loaded"));
}

#[test]
fn test_analyze_all_lists_ok_occurrences() {
    let dir = tempfile::TempDir::new().unwrap();
    let log = write_log(&dir);

    cmd()
        .current_dir(dir.path())
        .args(["analyze", "--min-support", "1", "--threshold", "20", "--all"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Occurrences in L2:"))
        .stdout(predicate::str::contains(
            "  Duration: 35.0000, Deviation: 15.0000, Status: Ok",
        ));
}
