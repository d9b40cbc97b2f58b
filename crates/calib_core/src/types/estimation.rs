//! Estimation result types.
//!
//! This module defines the result of one observation-model fit: the
//! estimated parameter vector, optional standard errors, the convergence
//! flag and diagnostic information.

use super::parameters::ParameterVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Fit diagnostics.
///
/// Contains detailed information about the fitting process
/// for analysis and debugging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationDiagnostics {
    /// Number of fitting iterations performed
    pub iterations: usize,
    /// Log-likelihood at the returned estimate
    pub log_likelihood: f64,
    /// Deviance at the returned estimate
    pub deviance: f64,
    /// Rows that entered the fit
    pub rows_used: usize,
    /// Rows dropped by the zero-feature policy
    pub rows_excluded: usize,
    /// Rows with at least one feature raised to the floor value
    pub rows_floored: usize,
    /// Wall time of the fit
    pub duration: Duration,
}

impl Default for EstimationDiagnostics {
    fn default() -> Self {
        Self {
            iterations: 0,
            log_likelihood: f64::NEG_INFINITY,
            deviance: f64::INFINITY,
            rows_used: 0,
            rows_excluded: 0,
            rows_floored: 0,
            duration: Duration::ZERO,
        }
    }
}

impl EstimationDiagnostics {
    /// Flatten into a name → value map.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("iterations".to_string(), self.iterations as f64);
        map.insert("log_likelihood".to_string(), self.log_likelihood);
        map.insert("deviance".to_string(), self.deviance);
        map.insert("rows_used".to_string(), self.rows_used as f64);
        map.insert("rows_excluded".to_string(), self.rows_excluded as f64);
        map.insert("rows_floored".to_string(), self.rows_floored as f64);
        map.insert("duration_secs".to_string(), self.duration.as_secs_f64());
        map
    }
}

/// Result of fitting the observation model once.
///
/// A fit that did not reach its stopping criterion is still a result:
/// `converged` is false and `estimate` holds the best available values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Estimated parameters (intercept first).
    pub estimate: ParameterVector,
    /// Asymptotic standard errors, when the information matrix is invertible.
    pub standard_errors: Option<Vec<f64>>,
    /// Whether the fit met its stopping criterion.
    pub converged: bool,
    /// Fit diagnostics.
    pub diagnostics: EstimationDiagnostics,
    /// Term names aligned with `estimate`.
    pub terms: Vec<String>,
}

impl EstimationResult {
    /// Create a converged result.
    pub fn converged(
        estimate: ParameterVector,
        standard_errors: Option<Vec<f64>>,
        diagnostics: EstimationDiagnostics,
    ) -> Self {
        Self {
            estimate,
            standard_errors,
            converged: true,
            diagnostics,
            terms: Vec::new(),
        }
    }

    /// Create a non-converged result carrying the best available estimate.
    pub fn not_converged(
        estimate: ParameterVector,
        standard_errors: Option<Vec<f64>>,
        diagnostics: EstimationDiagnostics,
    ) -> Self {
        Self {
            estimate,
            standard_errors,
            converged: false,
            diagnostics,
            terms: Vec::new(),
        }
    }

    /// Attach term names.
    pub fn with_terms(mut self, terms: Vec<String>) -> Self {
        self.terms = terms;
        self
    }
}

impl fmt::Display for EstimationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EstimationResult {{ converged: {}, iterations: {}, estimate: {}, log-likelihood: {:.6e} }}",
            self.converged, self.diagnostics.iterations, self.estimate, self.diagnostics.log_likelihood
        )
    }
}
