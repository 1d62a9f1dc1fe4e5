//! Integration tests for CLI commands.

use std::fs;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const KEYS: &[&str] = &["--keys", "1001,1501,1999,2500", "--heights", "0,2,1,0"];

fn skiproot(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_skiproot"))
        .args(args)
        .output()
        .expect("failed to run skiproot")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn root_of(list_args: &[&str]) -> String {
    let mut args = vec!["build", "--json"];
    args.extend_from_slice(list_args);
    stdout_json(&skiproot(&args))["root"]
        .as_str()
        .unwrap()
        .to_string()
}

fn write_proof(dir: &TempDir, rank: &str) -> String {
    let path = dir.path().join(format!("rank-{}.json", rank));
    let path = path.to_str().unwrap().to_string();
    let mut args = vec!["prove", "--rank", rank, "--output", path.as_str()];
    args.extend_from_slice(KEYS);
    let output = skiproot(&args);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    path
}

#[test]
fn build_reports_root_and_shape() {
    let mut args = vec!["build", "--json"];
    args.extend_from_slice(KEYS);
    let summary = stdout_json(&skiproot(&args));

    assert_eq!(summary["count"], 4);
    assert_eq!(summary["levels"], serde_json::json!([4, 2, 1, 0, 0, 0]));
    assert_eq!(summary["root"].as_str().unwrap().len(), 64);
}

#[test]
fn build_is_deterministic_per_seed() {
    let a = root_of(&["--count", "50", "--seed", "7"]);
    let b = root_of(&["--count", "50", "--seed", "7"]);
    let c = root_of(&["--count", "50", "--seed", "8"]);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn incremental_flag_gives_same_root() {
    let full = root_of(&["--count", "40", "--seed", "3"]);
    let incremental = root_of(&["--count", "40", "--seed", "3", "--incremental"]);
    assert_eq!(full, incremental);
}

#[test]
fn prove_then_verify_round_trip() {
    let dir = TempDir::new().unwrap();
    let root = root_of(KEYS);
    let proof = write_proof(&dir, "3");

    for mode in ["chained", "replay"] {
        let result = stdout_json(&skiproot(&[
            "verify", proof.as_str(), "--root", root.as_str(), "--mode", mode, "--json", "--strict",
        ]));
        assert_eq!(result["valid"], true, "mode {}", mode);
        assert_eq!(result["mode"], mode);
        assert_eq!(result["rank"], 3);
    }
}

#[test]
fn tampered_leaf_fails_strict_chained_verification() {
    let dir = TempDir::new().unwrap();
    let root = root_of(KEYS);
    let proof = write_proof(&dir, "2");

    let mut value: Value = serde_json::from_str(&fs::read_to_string(&proof).unwrap()).unwrap();
    value["leaf"] = value["steps"][1]["neighbor"].clone();
    fs::write(&proof, serde_json::to_string(&value).unwrap()).unwrap();

    let output = skiproot(&["verify", proof.as_str(), "--root", root.as_str(), "--strict"]);
    assert_eq!(output.status.code(), Some(1));

    let replay = stdout_json(&skiproot(&[
        "verify", proof.as_str(), "--root", root.as_str(), "--mode", "replay", "--json",
    ]));
    assert_eq!(replay["valid"], true);
}

#[test]
fn malformed_proof_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"rank": 1, "leaf": "nope", "steps": []}"#).unwrap();

    let root = "00".repeat(32);
    let output = skiproot(&["verify", path.to_str().unwrap(), "--root", root.as_str()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed proof"));
}

#[test]
fn out_of_range_rank_is_an_error() {
    let mut args = vec!["prove", "--rank", "5"];
    args.extend_from_slice(KEYS);
    let output = skiproot(&args);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: rank 5 out of range"));
}

#[test]
fn mismatched_heights_are_rejected() {
    let output = skiproot(&["build", "--keys", "1,2,3", "--heights", "0,1"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 heights given for 3 keys"));
}

#[test]
fn unknown_mode_is_rejected_by_argument_parsing() {
    let root = "00".repeat(32);
    let output = skiproot(&["verify", "--root", root.as_str(), "--mode", "shallow"]);
    assert!(!output.status.success());
}

#[test]
fn bench_verifies_every_rank() {
    for mode in ["replay", "chained"] {
        let summary = stdout_json(&skiproot(&[
            "bench", "--count", "16", "--seed", "1", "--mode", mode, "--json",
        ]));
        assert_eq!(summary["count"], 16);
        assert_eq!(summary["all_verified"], true);
        assert_eq!(summary["ranks"].as_array().unwrap().len(), 16);
        assert!(summary["generated_at"].as_str().unwrap().contains('T'));
        assert!(summary["proof_bytes"]["max"].as_f64().unwrap() > 0.0);
    }
}

#[test]
fn bench_table_matches_demo_layout() {
    let output = skiproot(&["bench"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.starts_with("Root: "));
    assert!(text.contains("Rank   Valid    Bytes Hashed"));
    assert!(text.contains("All verified? true"));
}
