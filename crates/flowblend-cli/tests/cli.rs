use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join(relative)
}

fn flowblend() -> Command {
    Command::cargo_bin("flowblend").unwrap()
}

#[test]
fn solve_prints_summary_table() {
    let case = repo_path("demos/two_node.json");
    flowblend()
        .args(["--log-level", "warn", "solve", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("objective"))
        .stdout(predicate::str::contains("300.0000"))
        .stdout(predicate::str::contains("optimal"));
}

#[test]
fn solve_writes_report_directory() {
    let out = tempdir().unwrap();
    let case = repo_path("demos/small_blending.toml");
    let config = repo_path("demos/plan.toml");
    flowblend()
        .args([
            "solve",
            case.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--quality-backend",
            "direct",
            "-o",
            out.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("direct LU"));

    for file in [
        "transfers.csv",
        "production.csv",
        "demand.csv",
        "storage.csv",
        "composition.csv",
        "summary.json",
    ] {
        assert!(out.path().join(file).exists(), "{file} missing");
    }
}

#[test]
fn solve_json_summary_without_composition() {
    let case = repo_path("demos/two_node.json");
    let output = flowblend()
        .args([
            "--log-level",
            "error",
            "solve",
            case.to_str().unwrap(),
            "--no-composition",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!((summary["objective"].as_f64().unwrap() - 300.0).abs() < 1e-4);
    assert!(summary.get("quality_status").is_none());
}

#[test]
fn infeasible_case_fails_with_reason() {
    let dir = tempdir().unwrap();
    let case = dir.path().join("infeasible.json");
    fs::write(
        &case,
        r#"{
            "sets": {
                "time_periods": ["T1"],
                "transport_modes": ["truck"],
                "customers": ["C01"],
                "freshwater_sources": ["F01"]
            },
            "parameters": {
                "topology": [{ "origin": "F01", "mode": "truck", "destination": "C01" }],
                "freshwater_availability": [{ "location": "F01", "period": "T1", "value": 100.0 }],
                "demand": [{ "location": "C01", "period": "T1", "value": 50.0 }]
            }
        }"#,
    )
    .unwrap();

    flowblend()
        .args(["solve", case.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("infeasible"));
}

#[test]
fn validate_reports_clean_demo() {
    let case = repo_path("demos/small_blending.toml");
    flowblend()
        .args(["validate", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("7 locations, 8 arcs, 3 periods"));
}

#[test]
fn validate_rejects_unknown_location() {
    let dir = tempdir().unwrap();
    let case = dir.path().join("bad.toml");
    fs::write(
        &case,
        r#"
[sets]
time_periods = ["T1"]
transport_modes = ["pipeline"]
swd_sites = ["K01"]

[[parameters.disposal_cost]]
location = "K99"
value = 1.0
"#,
    )
    .unwrap();

    flowblend()
        .args(["validate", case.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("K99"));
}

#[test]
fn graph_export_emits_dot() {
    let case = repo_path("demos/small_blending.toml");
    flowblend()
        .args(["graph", "export", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"))
        .stdout(predicate::str::contains("PP01"));
}

#[test]
fn graph_stats_counts_components() {
    let case = repo_path("demos/small_blending.toml");
    flowblend()
        .args(["graph", "stats", case.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Components    : 1"));
}

#[test]
fn batch_plans_every_case() {
    let out = tempdir().unwrap();
    flowblend()
        .args([
            "batch",
            repo_path("demos/two_node.json").to_str().unwrap(),
            repo_path("demos/small_blending.toml").to_str().unwrap(),
            "-o",
            out.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("two_node"))
        .stdout(predicate::str::contains("small_blending"));

    assert!(out.path().join("two_node").join("summary.json").exists());
    assert!(out.path().join("small_blending").join("summary.json").exists());
}

#[test]
fn rejects_non_positive_timeout() {
    let case = repo_path("demos/two_node.json");
    flowblend()
        .args(["solve", case.to_str().unwrap(), "--flow-timeout", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--flow-timeout"));
}

#[test]
fn batch_reports_unreadable_case_and_plans_the_rest() {
    let dir = tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ \"sets\": ").unwrap();
    let east = dir.path().join("east");
    let west = dir.path().join("west");
    fs::create_dir_all(&east).unwrap();
    fs::create_dir_all(&west).unwrap();
    fs::copy(repo_path("demos/two_node.json"), east.join("case.json")).unwrap();
    fs::copy(repo_path("demos/two_node.json"), west.join("case.json")).unwrap();
    let out = dir.path().join("out");

    flowblend()
        .args([
            "batch",
            east.join("case.json").to_str().unwrap(),
            broken.to_str().unwrap(),
            west.join("case.json").to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("broken"))
        .stdout(predicate::str::contains("invalid"))
        .stdout(predicate::str::contains("300.0000"))
        .stderr(predicate::str::contains("1 of 3 scenario(s) failed"));

    assert!(out.join("case").join("summary.json").exists());
    assert!(out.join("case-2").join("summary.json").exists());
    assert!(!out.join("broken").exists());
}
