use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture() -> PathBuf {
    let path = repo_root().join("fixtures").join("events").join("basic.json");
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn cli_lays_out_entity_columns() {
    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    let assert = Command::new(exe)
        .args(["columns", fixture().to_string_lossy().as_ref()])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());

    assert_eq!(value["view"], "columns");
    let columns = value["columns"].as_array().expect("columns");
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0]["entityId"], "ada");
    let placeholders = value["placeholders"].as_array().expect("placeholders");
    assert!(placeholders.iter().any(|p| p["eventIndex"] == 5));
}

#[test]
fn cli_expands_a_group_and_persists_state() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let state = tmp.path().join("state.json");

    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    let assert = Command::new(exe)
        .args([
            "lanes",
            "--by",
            "topic",
            "--state",
            state.to_string_lossy().as_ref(),
            "--expand",
            "harbor#0",
            "--state-out",
            state.to_string_lossy().as_ref(),
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();
    let value = stdout_json(assert.get_output());

    assert_eq!(value["view"], "lanes");
    let groups = value["groups"].as_array().expect("groups");
    let harbor = groups
        .iter()
        .find(|g| g["key"] == "harbor#0")
        .expect("harbor group");
    assert_eq!(harbor["memberEventIndexes"], serde_json::json!([0, 1]));
    assert_eq!(harbor["expanded"], true);
    assert!(
        groups
            .iter()
            .filter(|g| g["key"] != "harbor#0")
            .all(|g| g["expanded"] == false)
    );

    let saved: Value =
        serde_json::from_str(&fs::read_to_string(&state).expect("state written")).expect("json");
    assert_eq!(saved, serde_json::json!({ "harbor#0": true }));

    // A second run that only collapses reads the saved state back.
    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    Command::new(exe)
        .args([
            "lanes",
            "--by",
            "topic",
            "--state",
            state.to_string_lossy().as_ref(),
            "--collapse-all",
            "--state-out",
            state.to_string_lossy().as_ref(),
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();
    let saved: Value =
        serde_json::from_str(&fs::read_to_string(&state).expect("state written")).expect("json");
    assert_eq!(saved, serde_json::json!({ "harbor#0": false }));
}

#[test]
fn cli_reads_events_from_stdin() {
    let input = fs::read_to_string(fixture()).expect("read fixture");
    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    let assert = assert_cmd::Command::new(exe)
        .args(["curve", "--reference", "2021-05-01", "-"])
        .write_stdin(input)
        .assert()
        .success();
    let value = stdout_json(assert.get_output());

    assert_eq!(value["view"], "timeCurve");
    assert_eq!(value["points"].as_array().expect("points").len(), 5);
    let placeholders = value["placeholders"].as_array().expect("placeholders");
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0]["eventIndex"], 3);
}

#[test]
fn cli_prints_axis_ticks() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("ticks.json");

    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    Command::new(exe)
        .args([
            "ticks",
            "--pretty",
            "--out",
            out.to_string_lossy().as_ref(),
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let value: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("ticks written")).expect("json");
    assert!(value["interval"].is_string());
    assert!(!value["time"].as_array().expect("time").is_empty());
    let narrative = value["narrative"].as_array().expect("narrative");
    assert_eq!(narrative.first().expect("first")["value"], 0.0);
}

#[test]
fn cli_rejects_unknown_flags_with_usage_exit_code() {
    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    Command::new(exe)
        .args(["lanes", "--by", "mood", fixture().to_string_lossy().as_ref()])
        .assert()
        .code(2);
}

#[test]
fn cli_reports_bad_config_as_a_failure() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = tmp.path().join("config.json");
    fs::write(&config, r#"{ "route": { "gridSize": -1 } }"#).expect("write config");

    let exe = assert_cmd::cargo_bin!("chronolane-cli");
    let assert = Command::new(exe)
        .args([
            "columns",
            "--config",
            config.to_string_lossy().as_ref(),
            fixture().to_string_lossy().as_ref(),
        ])
        .assert()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("route.gridSize"), "{stderr}");
}
