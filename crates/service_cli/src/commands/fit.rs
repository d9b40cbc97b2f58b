//! Fit command implementation
//!
//! Fits the connectivity rule to a single synapse table.

use std::path::PathBuf;

use adapter_loader::ResultCollector;
use calib_controller::estimator_config;
use calib_core::types::EstimationResult;
use calib_estimator::{Estimator, PoissonGlmEstimator};
use clap::Args;
use infra_config::SessionSettings;
use tracing::info;

use crate::{CliError, Result};

/// Arguments of `synapse-calib fit`.
#[derive(Args, Debug, Clone)]
pub struct FitArgs {
    /// Synapse table (CSV)
    #[arg(short, long)]
    pub synapses: PathBuf,

    /// Zero-feature handling (floor, exclude)
    #[arg(short, long)]
    pub zero_policy: Option<String>,

    /// Floor applied to zero features
    #[arg(long)]
    pub floor: Option<f64>,

    /// Print the full estimation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the fit command
pub fn run(args: &FitArgs, mut settings: SessionSettings) -> Result<()> {
    if !args.synapses.exists() {
        return Err(CliError::FileNotFound(args.synapses.display().to_string()));
    }
    if let Some(policy) = &args.zero_policy {
        settings.estimator.zero_policy = policy.parse()?;
    }
    if let Some(floor) = args.floor {
        settings.estimator.floor_value = floor;
    }
    settings.validate()?;

    let result = fit_file(args, &settings)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_fit(&result);
    }
    Ok(())
}

fn fit_file(args: &FitArgs, settings: &SessionSettings) -> Result<EstimationResult> {
    let collector = ResultCollector::default();
    let records = collector.read_synapse_file(&args.synapses)?;
    let observations = collector.to_observations(&records)?;
    info!(
        file = %args.synapses.display(),
        rows = observations.len(),
        "Fitting connectivity rule"
    );
    let estimator = PoissonGlmEstimator::new(estimator_config(settings));
    Ok(estimator.fit_observations(&observations)?)
}

fn print_fit(result: &EstimationResult) {
    println!("{:<16} {:>14} {:>14}", "term", "estimate", "std. error");
    for (i, value) in result.estimate.iter().enumerate() {
        let term = result.terms.get(i).map(String::as_str).unwrap_or("?");
        let se = result
            .standard_errors
            .as_ref()
            .and_then(|se| se.get(i))
            .map(|s| format!("{:>14.6}", s))
            .unwrap_or_else(|| format!("{:>14}", "-"));
        println!("{:<16} {:>14.6} {}", term, value, se);
    }
    println!();
    let d = &result.diagnostics;
    println!(
        "converged: {}  iterations: {}  deviance: {:.4}  log-likelihood: {:.4}",
        result.converged, d.iterations, d.deviance, d.log_likelihood
    );
    println!(
        "rows used: {}  excluded: {}  floored: {}",
        d.rows_used, d.rows_excluded, d.rows_floored
    );
}
