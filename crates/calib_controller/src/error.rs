//! Controller errors.

use adapter_loader::LoaderError;
use adapter_simulator::GatewayError;
use calib_estimator::EstimationError;
use infra_config::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Anything that ends a calibration session as failed.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Configuration could not be loaded or materialised.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The simulator failed and the retry budget is spent.
    #[error("Simulator error: {0}")]
    Simulation(#[from] GatewayError),

    /// Simulator outputs could not be parsed.
    #[error("Result parsing error: {0}")]
    Parse(#[from] LoaderError),

    /// The estimator rejected the observations.
    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    /// Summary statistics reported FAILED under the abort policy.
    #[error("Summary statistics failed in iteration {iteration}: {}", names.join(", "))]
    StatisticFailed {
        /// Iteration that produced the statistics
        iteration: usize,
        /// Names of the failed statistics
        names: Vec<String>,
    },

    /// Invalid controller options.
    #[error("Invalid controller options: {0}")]
    InvalidOptions(String),
}

/// Coarse classification of a [`ControllerError`] for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Specification or settings.
    Config,
    /// Simulator run.
    Simulation,
    /// Simulator outputs.
    Parse,
    /// Model fit.
    Estimation,
    /// Summary statistic under the abort policy.
    Statistic,
    /// Controller options.
    Options,
}

impl ControllerError {
    /// Classification for reports.
    pub fn kind(&self) -> FailureKind {
        match self {
            ControllerError::Config(_) => FailureKind::Config,
            ControllerError::Simulation(GatewayError::Config(_)) => FailureKind::Config,
            ControllerError::Simulation(_) => FailureKind::Simulation,
            ControllerError::Parse(_) => FailureKind::Parse,
            ControllerError::Estimation(_) => FailureKind::Estimation,
            ControllerError::StatisticFailed { .. } => FailureKind::Statistic,
            ControllerError::InvalidOptions(_) => FailureKind::Options,
        }
    }
}
