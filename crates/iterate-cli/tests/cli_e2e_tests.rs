//! End-to-end tests for the iterate binary
//!
//! These tests run the compiled binary against repositories written to temp
//! directories and check:
//! - Record counts with and without path filters
//! - Emitted JSON and GeoJSON framing
//! - Error reporting for bad iterator URIs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write a feature at its id-derived path below `data`
fn write_feature(data: &Path, id: i64, placetype: &str) {
    let digits = id.to_string();
    let chunks: Vec<&str> = digits
        .as_bytes()
        .chunks(3)
        .map(|c| std::str::from_utf8(c).expect("ascii digits"))
        .collect();
    let dir = data.join(chunks.join("/"));
    fs::create_dir_all(&dir).expect("Failed to create feature directory");

    let feature = serde_json::json!({
        "type": "Feature",
        "id": id,
        "properties": {"wof:id": id, "wof:placetype": placetype},
        "geometry": {"type": "Point", "coordinates": [0.0, 0.0]}
    });
    fs::write(dir.join(format!("{id}.geojson")), feature.to_string())
        .expect("Failed to write feature");
}

/// A repository with 5 localities and 2 regions
fn create_test_repo() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let data = dir.path().join("data");

    for id in 1511838301..=1511838305 {
        write_feature(&data, id, "locality");
    }
    write_feature(&data, 85688637, "region");
    write_feature(&data, 85688623, "region");

    dir
}

fn iterate() -> Command {
    let mut cmd = Command::cargo_bin("iterate").expect("Failed to find iterate binary");
    cmd.env_remove("ITERATE_ITERATOR_URI");
    cmd
}

#[test]
fn test_schemes_lists_builtin_sources() {
    iterate()
        .arg("schemes")
        .assert()
        .success()
        .stdout(predicate::str::contains("repo://"))
        .stdout(predicate::str::contains("directory://"))
        .stdout(predicate::str::contains("null://"));
}

#[test]
fn test_count_repo() {
    let repo = create_test_repo();

    iterate()
        .args(["count", repo.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("7\n");
}

#[test]
fn test_count_with_include_filter() {
    let repo = create_test_repo();

    iterate()
        .args([
            "--iterator-uri",
            "repo://?_include=%2F151%5Cd%2B%5C.geojson%24",
            "count",
            repo.path().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn test_count_reads_iterator_uri_from_env() {
    let repo = create_test_repo();

    iterate()
        .env("ITERATE_ITERATOR_URI", "repo://?include=properties.wof:placetype=region")
        .args(["count", repo.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_emit_geojson() {
    let repo = create_test_repo();

    let output = iterate()
        .args(["emit", "--geojson", repo.path().to_str().unwrap()])
        .output()
        .expect("Failed to run iterate");
    assert!(output.status.success());

    let collection: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is not JSON");
    assert_eq!(collection["type"], "FeatureCollection");
    assert_eq!(collection["features"].as_array().unwrap().len(), 7);
}

#[test]
fn test_emit_json_array() {
    let repo = create_test_repo();

    let output = iterate()
        .args([
            "-i",
            "repo://?_max_procs=1",
            "emit",
            "--json",
            repo.path().to_str().unwrap(),
        ])
        .output()
        .expect("Failed to run iterate");
    assert!(output.status.success());

    let features: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("stdout is not a JSON array");
    assert_eq!(features.len(), 7);
}

#[test]
fn test_emit_null_writes_nothing() {
    let repo = create_test_repo();

    iterate()
        .args(["emit", "--null", "--geojson", repo.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_json_and_geojson_conflict() {
    iterate()
        .args(["emit", "--json", "--geojson", "/tmp"])
        .assert()
        .failure();
}

#[test]
fn test_count_requires_uris() {
    iterate().arg("count").assert().failure();
}

#[test]
fn test_unknown_scheme() {
    iterate()
        .args(["--iterator-uri", "s3://bucket", "count", "/tmp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unregistered scheme 's3'"))
        .stderr(predicate::str::contains("iterate schemes"));
}

#[test]
fn test_invalid_option_is_named() {
    iterate()
        .args(["--iterator-uri", "repo://?_max_procs=lots", "count", "/tmp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("_max_procs"));
}

#[test]
fn test_missing_directory_fails() {
    let dir = TempDir::new().unwrap();

    iterate()
        .args(["count", dir.path().join("nope").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Iteration failed"));
}
