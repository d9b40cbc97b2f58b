//! Integration tests for the configuration store.
//!
//! These tests exercise the on-disk lifecycle: loading a spec file,
//! persisting per-iteration snapshots and removing them again.

use calib_core::types::ParameterVector;
use infra_config::{
    CalibrationSpec, ConfigError, ConfigurationStore, OUTPUT_DIR_KEY, PARAMETERS_KEY,
    STATISTICS_KEY, STATISTICS_KEY_ALIAS,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

fn write_spec(dir: &Path, body: &Value) -> std::path::PathBuf {
    let path = dir.join("synapseSpec.json");
    std::fs::write(&path, serde_json::to_string_pretty(body).unwrap()).unwrap();
    path
}

fn sample_body(output_dir: &Path) -> Value {
    json!({
        "DATA_ROOT": "/data/model",
        "CONNECTIVITY_RULE_PARAMETERS": [0.0, 1.0, 1.0, -1.0],
        "OUTPUT_DIR": output_dir.to_string_lossy(),
        "STATISTIC_DEFINTIONS": [
            {"STATISTIC_NAME": "innervation", "STATISTIC_TYPE": "innervation", "BINS": 20}
        ]
    })
}

fn transient_files(dir: &Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("transient-"))
                    .unwrap_or(false)
            })
            .collect(),
        Err(_) => Vec::new(),
    }
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_spec_file() {
    let tmp = TempDir::new().unwrap();
    let path = write_spec(tmp.path(), &sample_body(&tmp.path().join("out")));

    let spec = ConfigurationStore::load(&path).unwrap();
    assert_eq!(spec.parameters().as_slice(), &[0.0, 1.0, 1.0, -1.0]);
    assert_eq!(spec.statistic_definitions()[0].name, "innervation");
    assert_eq!(spec.source(), Some(path.as_path()));
}

#[test]
fn test_load_missing_file() {
    let err = ConfigurationStore::load("/nonexistent/synapseSpec.json").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound(_)));
}

#[test]
fn test_load_malformed_json() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.json");
    std::fs::write(&path, "{ \"OUTPUT_DIR\": ").unwrap();
    let err = ConfigurationStore::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Json { .. }));
}

#[test]
fn test_load_reports_missing_key_and_file() {
    let tmp = TempDir::new().unwrap();
    let mut body = sample_body(&tmp.path().join("out"));
    body.as_object_mut().unwrap().remove(OUTPUT_DIR_KEY);
    let path = write_spec(tmp.path(), &body);

    let msg = ConfigurationStore::load(&path).unwrap_err().to_string();
    assert!(msg.contains(OUTPUT_DIR_KEY));
    assert!(msg.contains("synapseSpec.json"));
}

// ============================================================================
// Snapshot lifecycle
// ============================================================================

#[test]
fn test_persisted_snapshot_carries_new_parameters_and_extras() {
    let tmp = TempDir::new().unwrap();
    let path = write_spec(tmp.path(), &sample_body(&tmp.path().join("out")));
    let spec = ConfigurationStore::load(&path).unwrap();

    let run_dir = tmp.path().join("runs").join("r1");
    let mut snap = ConfigurationStore::snapshot(
        &spec,
        ParameterVector::new(vec![0.1, 0.9, 1.1, -1.0]),
    )
    .unwrap()
    .with_output_dir(&run_dir);

    let written = snap.persist(tmp.path()).unwrap().to_path_buf();
    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(doc[PARAMETERS_KEY], json!([0.1, 0.9, 1.1, -1.0]));
    assert_eq!(doc[OUTPUT_DIR_KEY], json!(run_dir.to_string_lossy()));
    assert_eq!(doc["DATA_ROOT"], json!("/data/model"));
    assert_eq!(doc[STATISTICS_KEY][0]["BINS"], json!(20));

    // The template file is untouched.
    let reloaded = ConfigurationStore::load(&path).unwrap();
    assert_eq!(reloaded.parameters(), spec.parameters());

    ConfigurationStore::release(snap).unwrap();
    assert!(!written.exists());
}

#[test]
fn test_corrected_statistics_key_is_persisted_as_simulator_key() {
    let tmp = TempDir::new().unwrap();
    let mut body = sample_body(&tmp.path().join("out"));
    let defs = body.as_object_mut().unwrap().remove(STATISTICS_KEY).unwrap();
    body[STATISTICS_KEY_ALIAS] = defs;
    let path = write_spec(tmp.path(), &body);
    let spec = ConfigurationStore::load(&path).unwrap();

    let mut snap = ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap();
    let written = snap.persist(tmp.path()).unwrap().to_path_buf();
    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(doc[STATISTICS_KEY][0]["STATISTIC_NAME"], json!("innervation"));
    assert!(doc.get(STATISTICS_KEY_ALIAS).is_none());
}

#[test]
fn test_dropped_snapshot_removes_file() {
    let tmp = TempDir::new().unwrap();
    let spec = CalibrationSpec::new(ParameterVector::new(vec![0.0, 1.0]), tmp.path());

    let written = {
        let mut snap =
            ConfigurationStore::snapshot(&spec, ParameterVector::new(vec![1.0, 2.0])).unwrap();
        snap.persist(tmp.path()).unwrap().to_path_buf()
    };
    assert!(!written.exists());
    assert!(transient_files(tmp.path()).is_empty());
}

#[test]
fn test_concurrent_snapshots_use_distinct_files() {
    let tmp = TempDir::new().unwrap();
    let spec = CalibrationSpec::new(ParameterVector::new(vec![0.0, 1.0]), tmp.path());

    let mut a = ConfigurationStore::snapshot(&spec, ParameterVector::new(vec![1.0, 1.0])).unwrap();
    let mut b = ConfigurationStore::snapshot(&spec, ParameterVector::new(vec![2.0, 2.0])).unwrap();
    let pa = a.persist(tmp.path()).unwrap().to_path_buf();
    let pb = b.persist(tmp.path()).unwrap().to_path_buf();
    assert_ne!(pa, pb);
    assert_eq!(transient_files(tmp.path()).len(), 2);

    ConfigurationStore::release(a).unwrap();
    ConfigurationStore::release(b).unwrap();
    assert!(transient_files(tmp.path()).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_no_transient_survives_release(values in prop::collection::vec(-5.0f64..5.0, 4), fail in any::<bool>()) {
        let tmp = TempDir::new().unwrap();
        let spec = CalibrationSpec::new(ParameterVector::new(vec![0.0; 4]), tmp.path());
        let mut snap = ConfigurationStore::snapshot(&spec, ParameterVector::new(values.clone())).unwrap();
        snap.persist(tmp.path()).unwrap();

        if fail {
            // Simulated error path: the snapshot is simply dropped.
            drop(snap);
        } else {
            ConfigurationStore::release(snap).unwrap();
        }
        prop_assert!(transient_files(tmp.path()).is_empty());
    }
}
