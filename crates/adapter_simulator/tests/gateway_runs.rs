//! Integration tests for the simulator gateway.
//!
//! A scripted in-process backend stands in for the simulator so that
//! failures, retries and run isolation can be driven deterministically.

use adapter_simulator::{
    GatewayError, LeaseRegistry, RetryPolicy, SimulationMode, SimulatorBackend,
    SimulatorGateway,
};
use calib_core::types::ParameterVector;
use infra_config::{CalibrationSpec, ConfigurationStore, OUTPUT_DIR_KEY, PARAMETERS_KEY};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Fails the first `failures` calls, then writes a marker file with the
/// parameters it was given.
struct ScriptedBackend {
    failures: u32,
    calls: Arc<AtomicU32>,
    seen_specs: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedBackend {
    fn new(failures: u32) -> (Self, Arc<AtomicU32>, Arc<Mutex<Vec<PathBuf>>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                failures,
                calls: calls.clone(),
                seen_specs: seen.clone(),
            },
            calls,
            seen,
        )
    }
}

impl SimulatorBackend for ScriptedBackend {
    fn execute(
        &self,
        mode: &SimulationMode,
        spec_path: &Path,
        output_dir: &Path,
    ) -> Result<(), GatewayError> {
        assert_eq!(mode, &SimulationMode::Synapse);
        assert!(spec_path.exists(), "spec must exist while the simulator runs");
        self.seen_specs.lock().unwrap().push(spec_path.to_path_buf());

        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            return Err(GatewayError::simulation_failed(Some(2), "scripted failure"));
        }
        let doc: Value = serde_json::from_str(&std::fs::read_to_string(spec_path).unwrap()).unwrap();
        std::fs::write(
            output_dir.join("parameters.json"),
            doc[PARAMETERS_KEY].to_string(),
        )
        .unwrap();
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn template(dir: &Path) -> CalibrationSpec {
    CalibrationSpec::new(ParameterVector::new(vec![0.0, 1.0, 1.0, -1.0]), dir)
}

#[test]
fn test_run_writes_into_leased_directory() {
    let tmp = TempDir::new().unwrap();
    let spec = template(tmp.path());
    let (backend, _, seen) = ScriptedBackend::new(0);
    let gateway = SimulatorGateway::new(backend).with_session_id("s1");

    let transient = ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap();
    let outcome = gateway.run(transient, &SimulationMode::Synapse, 1).unwrap();

    assert_eq!(outcome.output_dir(), tmp.path().join("runs").join("s1-1-1"));
    assert!(outcome.output_dir().join("parameters.json").exists());
    assert_eq!(outcome.attempts(), 1);
    assert!(gateway.registry().is_held(outcome.output_dir()));

    // The run spec is gone once the simulator has exited.
    for path in seen.lock().unwrap().iter() {
        assert!(!path.exists());
    }

    let dir = outcome.output_dir().to_path_buf();
    outcome.release().unwrap();
    assert!(!gateway.registry().is_held(&dir));
    assert!(dir.exists(), "outputs are kept by default");
}

#[test]
fn test_retry_recovers_within_budget() {
    let tmp = TempDir::new().unwrap();
    let spec = template(tmp.path());
    let (backend, calls, seen) = ScriptedBackend::new(2);
    let gateway = SimulatorGateway::new(backend).with_session_id("s2");

    let outcome = gateway
        .run_with_retry(
            &spec,
            spec.parameters(),
            3,
            &SimulationMode::Synapse,
            &RetryPolicy::immediate(2),
        )
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(outcome.attempts(), 3);
    assert_eq!(outcome.output_dir(), tmp.path().join("runs").join("s2-3-3"));
    assert!(seen.lock().unwrap().iter().all(|p| !p.exists()));
}

#[test]
fn test_retry_budget_exhausted() {
    let tmp = TempDir::new().unwrap();
    let spec = template(tmp.path());
    let (backend, calls, seen) = ScriptedBackend::new(5);
    let gateway = SimulatorGateway::new(backend).keep_outputs(false);

    let err = gateway
        .run_with_retry(
            &spec,
            spec.parameters(),
            1,
            &SimulationMode::Synapse,
            &RetryPolicy::immediate(1),
        )
        .unwrap_err();

    assert!(matches!(err, GatewayError::SimulationFailed { exit_code: Some(2), .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(gateway.registry().is_empty());
    assert!(seen.lock().unwrap().iter().all(|p| !p.exists()));
    assert!(!tmp.path().join("runs").join(format!("{}-1-1", gateway.session_id())).exists());
}

#[test]
fn test_concurrent_gateways_share_registry() {
    let tmp = TempDir::new().unwrap();
    let spec = template(tmp.path());
    let registry = LeaseRegistry::new();

    let (a, _, _) = ScriptedBackend::new(0);
    let (b, _, _) = ScriptedBackend::new(0);
    let first = SimulatorGateway::new(a)
        .with_session_id("shared")
        .with_registry(registry.clone());
    let second = SimulatorGateway::new(b)
        .with_session_id("shared")
        .with_registry(registry.clone());

    let held = first
        .run(
            ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap(),
            &SimulationMode::Synapse,
            1,
        )
        .unwrap();
    let err = second
        .run(
            ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap(),
            &SimulationMode::Synapse,
            1,
        )
        .unwrap_err();
    assert!(matches!(err, GatewayError::OutputDirInUse(_)));

    held.release().unwrap();
    assert!(registry.is_empty());
}

#[cfg(unix)]
mod process {
    use super::*;
    use adapter_simulator::ProcessBackend;
    use std::os::unix::fs::PermissionsExt;

    fn script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-sim.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn test_process_backend_success() {
        let tmp = TempDir::new().unwrap();
        let bin = script(tmp.path(), "[ \"$1\" = SYNAPSE ] || exit 3\ncp \"$2\" ./seen.json");
        let spec = template(&tmp.path().join("out"));
        let gateway = SimulatorGateway::new(ProcessBackend::new(bin)).with_session_id("p");

        let outcome = gateway
            .run(
                ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap(),
                &SimulationMode::Synapse,
                1,
            )
            .unwrap();
        assert!(outcome.output_dir().join("seen.json").exists());
    }

    #[test]
    fn test_process_backend_failure_reports_exit_code_and_stderr() {
        let tmp = TempDir::new().unwrap();
        let bin = script(tmp.path(), "echo 'no neurons selected' >&2\nexit 7");
        let spec = template(&tmp.path().join("out"));
        let gateway = SimulatorGateway::new(ProcessBackend::new(bin));

        let err = gateway
            .run(
                ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap(),
                &SimulationMode::Synapse,
                1,
            )
            .unwrap_err();
        match err {
            GatewayError::SimulationFailed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(7));
                assert!(stderr.contains("no neurons selected"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_relative_output_dir_is_resolved_before_spawning() {
        // Relative to the test's working directory, as in a spec file that
        // sits next to the simulator.
        let rel = tempfile::Builder::new()
            .prefix("rel-out")
            .tempdir_in(".")
            .unwrap();
        assert!(rel.path().is_relative());
        let bin = script(
            rel.path(),
            "test -f \"$2\" || { echo \"spec not found: $2\" >&2; exit 9; }\ncp \"$2\" ./seen.json",
        );
        let spec = template(&rel.path().join("output"));
        let gateway = SimulatorGateway::new(ProcessBackend::new(&bin)).with_session_id("rel");

        let outcome = gateway
            .run(
                ConfigurationStore::snapshot(&spec, spec.parameters().clone()).unwrap(),
                &SimulationMode::Synapse,
                1,
            )
            .unwrap();

        assert!(outcome.output_dir().is_absolute());
        assert!(outcome.output_dir().ends_with("output/runs/rel-1-1"));
        let seen: Value = serde_json::from_str(
            &std::fs::read_to_string(outcome.output_dir().join("seen.json")).unwrap(),
        )
        .unwrap();
        let written = PathBuf::from(seen[OUTPUT_DIR_KEY].as_str().unwrap());
        assert_eq!(written, outcome.output_dir());
        outcome.release().unwrap();
    }
}
