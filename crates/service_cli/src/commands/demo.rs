//! Demo command: a full calibration session against an in-process
//! synthetic simulator.
//!
//! The synthetic simulator ignores the proposed parameters for its rule and
//! always draws Poisson counts from `--theta`, echoing the proposal only in
//! the summary report. The loop should therefore move from `--initial` to
//! an estimate of `--theta` in the first iteration and stop in the second.
//!
//! # Expected Output
//!
//! ```text
//! Session 1a2b3c4d: converged
//!
//!  iter attempts     rows     deviance  estimate
//!     1        1     5000          ...  [0.01, 0.99, 1.00, -0.99]
//!     2        1     5000          ...  [0.01, 0.99, 1.00, -0.99]
//! ```

use std::path::{Path, PathBuf};

use adapter_loader::{
    ResultCollector, SummaryStatisticsWriter, SynapseTableWriter, SUMMARY_FILE, SYNAPSES_FILE,
};
use adapter_simulator::{GatewayError, SimulationMode, SimulatorBackend, SimulatorGateway};
use calib_controller::{estimator_config, CalibrationController, ControllerOptions, SessionReport};
use calib_core::synthetic::{CountNoise, SyntheticConfig, SyntheticSynapses};
use calib_core::types::{ParameterVector, StatisticResult, StatisticStatus, SynapseRecord};
use calib_estimator::PoissonGlmEstimator;
use clap::Args;
use infra_config::{
    CalibrationSpec, ConfigurationStore, SessionSettings, StatisticRequest, PARAMETERS_KEY,
};
use tracing::info;

use crate::{CliError, Result};

/// Arguments of `synapse-calib demo`.
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Rule applied by the synthetic simulator
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0,1,1,-1")]
    pub theta: Vec<f64>,

    /// Starting parameters of the session
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_value = "0,0.5,0.5,-0.5")]
    pub initial: Vec<f64>,

    /// Synapse records per run
    #[arg(long, default_value = "5000")]
    pub rows: usize,

    /// RNG seed of the synthetic simulator
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Directory receiving the run directories
    #[arg(short, long, default_value = "calib-demo")]
    pub output_dir: PathBuf,

    /// Write the session report (JSON) to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// In-process simulator drawing synapse tables from a fixed rule.
#[derive(Debug, Clone)]
pub struct SyntheticBackend {
    theta: ParameterVector,
    rows: usize,
    seed: u64,
}

impl SyntheticBackend {
    pub fn new(theta: ParameterVector, rows: usize, seed: u64) -> Self {
        Self { theta, rows, seed }
    }

    fn statistics(records: &[SynapseRecord]) -> Vec<StatisticResult> {
        let n = records.len().max(1) as f64;
        let mean = records.iter().map(|r| r.count).sum::<f64>() / n;
        let zeros = records.iter().filter(|r| r.count == 0.0).count() as f64 / n;
        vec![
            StatisticResult::new("mean_count", StatisticStatus::Ok, Some(mean)),
            StatisticResult::new("zero_fraction", StatisticStatus::Ok, Some(zeros)),
        ]
    }
}

impl SimulatorBackend for SyntheticBackend {
    fn execute(
        &self,
        _mode: &SimulationMode,
        spec_path: &Path,
        output_dir: &Path,
    ) -> std::result::Result<(), GatewayError> {
        let spec = ConfigurationStore::load(spec_path)?;
        let config = SyntheticConfig {
            rows: self.rows,
            seed: self.seed,
            noise: CountNoise::Poisson,
            ..Default::default()
        };
        let records = SyntheticSynapses::new(self.theta.clone(), config).generate();
        let failed = |e: adapter_loader::LoaderError| GatewayError::simulation_failed(None, e.to_string());

        SynapseTableWriter::default()
            .write(&output_dir.join(SYNAPSES_FILE), &records)
            .map_err(failed)?;
        let generation = serde_json::json!({ PARAMETERS_KEY: spec.parameters().as_slice() });
        SummaryStatisticsWriter::write(
            &output_dir.join(SUMMARY_FILE),
            &generation,
            &Self::statistics(&records),
        )
        .map_err(failed)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

fn parameters(values: &[f64], flag: &str) -> Result<ParameterVector> {
    let theta = ParameterVector::new(values.to_vec());
    if theta.len() < 2 || !theta.is_finite() {
        return Err(CliError::InvalidArgument(format!(
            "--{} needs an intercept and at least one finite coefficient",
            flag
        )));
    }
    Ok(theta)
}

/// Run one synthetic session and return its report.
pub fn session(args: &DemoArgs, settings: &SessionSettings) -> Result<SessionReport> {
    let theta = parameters(&args.theta, "theta")?;
    let initial = parameters(&args.initial, "initial")?;
    if theta.len() != initial.len() {
        return Err(CliError::InvalidArgument(format!(
            "--theta has {} values, --initial has {}",
            theta.len(),
            initial.len()
        )));
    }
    if theta.len() != 4 {
        return Err(CliError::InvalidArgument(
            "the synapse table carries pre, post and postAll; give 4 values".to_string(),
        ));
    }
    std::fs::create_dir_all(&args.output_dir)?;

    let spec = CalibrationSpec::new(initial, &args.output_dir)
        .with_statistic(StatisticRequest::new("mean_count"))
        .with_statistic(StatisticRequest::new("zero_fraction"));
    let gateway = SimulatorGateway::new(SyntheticBackend::new(theta.clone(), args.rows, args.seed))
        .keep_outputs(settings.simulator.keep_run_outputs);
    let estimator = PoissonGlmEstimator::new(estimator_config(settings));

    info!(theta = %theta, rows = args.rows, seed = args.seed, "Starting synthetic session");
    let mut controller =
        CalibrationController::with_estimator(spec, gateway, ResultCollector::default(), estimator)
            .with_options(ControllerOptions::from_settings(settings));
    Ok(controller.run())
}

/// Run the demo command
pub fn run(args: &DemoArgs, settings: SessionSettings) -> Result<()> {
    println!("========================================");
    println!("Connectivity-rule calibration demo");
    println!("========================================");
    println!("simulator rule: {:?}", args.theta);
    println!("initial:        {:?}", args.initial);
    println!();

    let report = session(args, &settings)?;
    super::calibrate::finish(&report, args.report.as_deref())
}
