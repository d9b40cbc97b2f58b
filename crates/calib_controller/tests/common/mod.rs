//! In-process simulator used by the controller tests.
//!
//! Reads the parameters from the transient specification, draws a
//! noise-free synapse table from the log-linear rule and writes it together
//! with a summary report into the run directory.

#![allow(dead_code)]

use adapter_loader::{
    SummaryStatisticsWriter, SynapseTableWriter, SUMMARY_FILE, SYNAPSES_FILE,
};
use adapter_simulator::{GatewayError, SimulationMode, SimulatorBackend};
use calib_core::synthetic::{CountNoise, SyntheticConfig, SyntheticSynapses};
use calib_core::types::{ParameterVector, StatisticResult, StatisticStatus};
use infra_config::{CalibrationSpec, PARAMETERS_KEY};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

pub const TRUE_THETA: [f64; 4] = [0.0, 1.0, 1.0, -1.0];

/// Which rule the stub simulator applies.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Use the parameters from the specification.
    Echo,
    /// Ignore the specification and apply a fixed rule.
    Fixed(ParameterVector),
}

#[derive(Debug, Clone)]
pub struct StubSimulator {
    pub rule: Rule,
    pub rows: usize,
    pub failures: u32,
    pub malformed: bool,
    pub write_summary: bool,
    pub statuses: Vec<(String, String)>,
    pub calls: Arc<AtomicU32>,
    pub run_dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl Default for StubSimulator {
    fn default() -> Self {
        Self {
            rule: Rule::Echo,
            rows: 300,
            failures: 0,
            malformed: false,
            write_summary: true,
            statuses: vec![("mean_count".to_string(), "OK".to_string())],
            calls: Arc::new(AtomicU32::new(0)),
            run_dirs: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl StubSimulator {
    pub fn fixed(theta: &[f64]) -> Self {
        Self {
            rule: Rule::Fixed(ParameterVector::new(theta.to_vec())),
            ..Default::default()
        }
    }

    pub fn failing(mut self, failures: u32) -> Self {
        self.failures = failures;
        self
    }

    pub fn malformed(mut self) -> Self {
        self.malformed = true;
        self
    }

    pub fn without_summary(mut self) -> Self {
        self.write_summary = false;
        self
    }

    pub fn with_status(mut self, name: &str, status: &str) -> Self {
        self.statuses.push((name.to_string(), status.to_string()));
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_dirs(&self) -> Vec<PathBuf> {
        self.run_dirs.lock().unwrap().clone()
    }
}

fn read_parameters(spec_path: &Path) -> ParameterVector {
    let text = std::fs::read_to_string(spec_path).unwrap();
    let doc: Value = serde_json::from_str(&text).unwrap();
    let values = doc[PARAMETERS_KEY]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    ParameterVector::new(values)
}

impl SimulatorBackend for StubSimulator {
    fn execute(
        &self,
        _mode: &SimulationMode,
        spec_path: &Path,
        output_dir: &Path,
    ) -> Result<(), GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.run_dirs.lock().unwrap().push(output_dir.to_path_buf());
        if n < self.failures {
            return Err(GatewayError::simulation_failed(Some(1), "stub failure"));
        }

        let requested = read_parameters(spec_path);
        let theta = match &self.rule {
            Rule::Echo => requested.clone(),
            Rule::Fixed(theta) => theta.clone(),
        };

        let synapses = output_dir.join(SYNAPSES_FILE);
        if self.malformed {
            std::fs::write(
                &synapses,
                "presynapticNeuronID,postsynapticNeuronID,pre,post,postAll,count\n1,2,abc,1,1,3\n",
            )
            .unwrap();
        } else {
            let config = SyntheticConfig {
                rows: self.rows,
                seed: 7,
                noise: CountNoise::None,
                ..Default::default()
            };
            let records = SyntheticSynapses::new(theta, config).generate();
            SynapseTableWriter::default().write(&synapses, &records).unwrap();
        }

        if self.write_summary {
            let stats: Vec<StatisticResult> = self
                .statuses
                .iter()
                .map(|(name, status)| {
                    StatisticResult::new(name.as_str(), StatisticStatus::classify(status), Some(1.0))
                        .with_message(status.as_str())
                })
                .collect();
            let generation = serde_json::json!({ PARAMETERS_KEY: requested.as_slice() });
            SummaryStatisticsWriter::write(&output_dir.join(SUMMARY_FILE), &generation, &stats)
                .unwrap();
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

pub fn spec(output_dir: &Path, initial: &[f64]) -> CalibrationSpec {
    CalibrationSpec::new(ParameterVector::new(initial.to_vec()), output_dir)
}
