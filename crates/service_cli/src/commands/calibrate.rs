//! Calibrate command implementation
//!
//! Runs the calibration loop against the external simulator.

use std::path::{Path, PathBuf};

use adapter_loader::ResultCollector;
use adapter_simulator::{ProcessBackend, SimulatorGateway};
use calib_controller::{estimator_config, CalibrationController, ControllerOptions, SessionReport};
use calib_estimator::PoissonGlmEstimator;
use clap::Args;
use infra_config::{ConfigurationStore, FailureAction, SessionSettings};
use tracing::info;

use crate::{CliError, Result};

/// Arguments of `synapse-calib calibrate`.
#[derive(Args, Debug, Clone, Default)]
pub struct CalibrateArgs {
    /// Simulator specification (JSON)
    #[arg(short, long)]
    pub spec: PathBuf,

    /// Simulator executable
    #[arg(long)]
    pub simulator: Option<PathBuf>,

    /// Simulation mode passed to the simulator
    #[arg(long)]
    pub mode: Option<String>,

    /// Iteration budget
    #[arg(short = 'n', long)]
    pub max_iterations: Option<usize>,

    /// Parameter tolerance of the stopping rule
    #[arg(short, long)]
    pub tolerance: Option<f64>,

    /// Retries per iteration after a simulator failure
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Damping factor in (0, 1]
    #[arg(long)]
    pub damping: Option<f64>,

    /// Fail the session when a summary statistic reports FAILED
    #[arg(long)]
    pub abort_on_failed_statistic: bool,

    /// Remove run directories once an iteration is collected
    #[arg(long)]
    pub discard_outputs: bool,

    /// Write the session report (JSON) to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl CalibrateArgs {
    /// Apply command-line overrides on top of the resolved settings.
    pub fn apply(&self, settings: &mut SessionSettings) {
        if let Some(binary) = &self.simulator {
            settings.simulator.binary = binary.clone();
        }
        if let Some(mode) = &self.mode {
            settings.simulator.mode = mode.clone();
        }
        if let Some(n) = self.max_iterations {
            settings.calibration.max_iterations = n;
        }
        if let Some(tol) = self.tolerance {
            settings.calibration.tolerance = tol;
        }
        if let Some(retries) = self.retries {
            settings.retry.max_retries = retries;
        }
        if let Some(damping) = self.damping {
            settings.calibration.damping = damping;
        }
        if self.abort_on_failed_statistic {
            settings.calibration.statistic_failure = FailureAction::Abort;
        }
        if self.discard_outputs {
            settings.simulator.keep_run_outputs = false;
        }
    }
}

/// Run the calibrate command
pub fn run(args: &CalibrateArgs, mut settings: SessionSettings) -> Result<()> {
    if !args.spec.exists() {
        return Err(CliError::FileNotFound(args.spec.display().to_string()));
    }
    args.apply(&mut settings);
    settings.validate()?;

    let spec = ConfigurationStore::load(&args.spec)?;
    info!(
        spec = %args.spec.display(),
        simulator = %settings.simulator.binary.display(),
        max_iterations = settings.calibration.max_iterations,
        tolerance = settings.calibration.tolerance,
        "Starting calibration"
    );

    let gateway = SimulatorGateway::new(ProcessBackend::new(&settings.simulator.binary))
        .keep_outputs(settings.simulator.keep_run_outputs);
    let estimator = PoissonGlmEstimator::new(estimator_config(&settings));
    let mut controller =
        CalibrationController::with_estimator(spec, gateway, ResultCollector::default(), estimator)
            .with_options(ControllerOptions::from_settings(&settings));

    let report = controller.run();
    finish(&report, args.report.as_deref())
}

/// Print the report, optionally write it, and map failure to an error.
pub(crate) fn finish(report: &SessionReport, path: Option<&Path>) -> Result<()> {
    print_report(report);
    if let Some(path) = path {
        report.write_json(path)?;
        info!(path = %path.display(), "Session report written");
    }
    match &report.failure {
        Some(failure) => Err(CliError::CalibrationFailed {
            state: report.state.to_string(),
            message: failure.message.clone(),
        }),
        None => Ok(()),
    }
}

/// Human-readable session summary on stdout.
pub(crate) fn print_report(report: &SessionReport) {
    println!("Session {}: {}", report.session_id, report.state);
    if let Some(budget) = &report.budget {
        println!("  budget exhausted: {:?}", budget);
    }
    println!();
    println!(
        "{:>5} {:>8} {:>8} {:>12}  estimate",
        "iter", "attempts", "rows", "deviance"
    );
    for it in &report.iterations {
        println!(
            "{:>5} {:>8} {:>8} {:>12.4}  {}",
            it.iteration, it.attempts, it.rows_used, it.deviance, it.estimate
        );
        if !it.flagged_statistics.is_empty() {
            println!("      flagged: {}", it.flagged_statistics.join(", "));
        }
    }
    println!();
    println!("initial: {}", report.initial_parameters);
    println!("final:   {}", report.final_parameters);
    if let Some(failure) = &report.failure {
        println!("failure: {}", failure.message);
    }
}
