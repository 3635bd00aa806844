use std::path::PathBuf;
use std::process::{Command, Output};

use hof_harness::PlayerRecord;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Run `hof` from an empty directory with fixture data and no search key.
fn run_hof(args: &[&str]) -> Output {
    let dir = tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_hof"))
        .current_dir(dir.path())
        .env_remove("BING_SEARCH_API_KEY")
        .env_remove("HOF_DATA_PATH")
        .env_remove("HOF_MODEL_PATH")
        .env("RUST_LOG", "off")
        .arg("--data")
        .arg(fixture("players.csv"))
        .arg("--model")
        .arg(fixture("hof_gam.json"))
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn cli_catalog_lists_capabilities() {
    let output = run_hof(&["catalog"]);
    assert!(output.status.success());

    let catalog: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<&str> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "GetPlayerProbabilityOfHallOfFame",
            "GetBaseballPlayerStats",
            "GetWebSearchResults",
            "GetWebSearchEvidence",
        ]
    );
}

#[test]
fn cli_stats_prints_player_record() {
    let output = run_hof(&["stats", "--name", "Mike Trout"]);
    assert!(output.status.success());

    let record: PlayerRecord = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(record.id, "troutm01");
    assert_eq!(record.home_runs, 378.0);
}

#[test]
fn cli_predict_by_name_and_record() {
    let output = run_hof(&["predict", "--name", "Mike Trout"]);
    assert!(output.status.success());
    let p: f64 = stdout(&output).trim().parse().unwrap();
    let expected = 1.0 / (1.0 + (-0.5f64).exp());
    assert!(approx_eq(p, expected, 1e-9));

    let dir = tempdir().unwrap();
    let record_path = dir.path().join("trout.json");
    let record: PlayerRecord = "true,true,Mike Trout,14,6432,1094,1934,346,51,378,940,204,0.301,0.585,11,3772,20,2024,troutm01"
        .parse()
        .unwrap();
    std::fs::write(&record_path, serde_json::to_string(&record).unwrap()).unwrap();

    let output = run_hof(&["predict", "--record", record_path.to_str().unwrap(), "--full"]);
    assert!(output.status.success());
    let full: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(full["predictedLabel"], true);
    assert!(approx_eq(full["probability"].as_f64().unwrap(), expected, 1e-9));
    assert!(approx_eq(full["score"].as_f64().unwrap(), 0.5, 1e-9));
}

#[test]
fn cli_reports_error_kind_and_fails() {
    let output = run_hof(&["stats", "--name", "Nonexistent Player"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error [not_found]"), "stderr: {stderr}");

    let output = run_hof(&["evidence", "--name", "Mike Trout"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error [provider_unavailable]"), "stderr: {stderr}");
}

#[test]
fn cli_invoke_dispatches_by_capability_name() {
    let output = run_hof(&[
        "invoke",
        "--capability",
        "GetBaseballPlayerStats",
        "--args",
        r#"{"nameOfBaseballPlayer":"Hank Aaron"}"#,
    ]);
    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(record["id"], "aaronha01");
}
