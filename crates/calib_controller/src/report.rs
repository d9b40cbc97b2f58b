//! Session reports.

use crate::error::{ControllerError, FailureKind};
use crate::state::{Budget, ControllerState};
use calib_core::types::{EstimationResult, ParameterVector, StatisticResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happened in one iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// 1-based iteration number.
    pub iteration: usize,
    /// Parameters handed to the simulator.
    pub proposed: ParameterVector,
    /// Estimate fitted to the simulator's output.
    pub estimate: ParameterVector,
    /// Whether the estimator converged.
    pub estimator_converged: bool,
    /// Simulator attempts used.
    pub attempts: u32,
    /// Rows that entered the fit.
    pub rows_used: usize,
    /// Deviance of the fit.
    pub deviance: f64,
    /// Summary statistics reported by the simulator.
    pub statistics: Vec<StatisticResult>,
    /// Names of statistics that were not OK.
    pub flagged_statistics: Vec<String>,
}

/// Why a session failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Error class.
    pub kind: FailureKind,
    /// Rendered error.
    pub message: String,
    /// Iteration in which the error occurred, if any.
    pub iteration: Option<usize>,
}

impl FailureRecord {
    pub(crate) fn from_error(error: &ControllerError, iteration: Option<usize>) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            iteration,
        }
    }
}

/// Outcome of a calibration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier used in run directory names.
    pub session_id: String,
    /// Terminal state.
    pub state: ControllerState,
    /// Budget that ended the session, for `IterationBudgetExhausted`.
    pub budget: Option<Budget>,
    /// Failure details, for `Failed`.
    pub failure: Option<FailureRecord>,
    /// Initial parameters.
    pub initial_parameters: ParameterVector,
    /// Last estimate, or the initial parameters if nothing was estimated.
    pub final_parameters: ParameterVector,
    /// Last full estimation result.
    pub last_estimate: Option<EstimationResult>,
    /// Per-iteration history.
    pub iterations: Vec<IterationRecord>,
    /// Session start.
    pub started_at: DateTime<Utc>,
    /// Session end.
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    /// Number of completed iterations.
    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// Whether the session converged.
    pub fn is_converged(&self) -> bool {
        self.state == ControllerState::Converged
    }

    /// Whether the session failed.
    pub fn is_failed(&self) -> bool {
        self.state == ControllerState::Failed
    }

    /// Pretty JSON rendering.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON rendering to `path`.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let text = self.to_json_pretty().map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }
}
