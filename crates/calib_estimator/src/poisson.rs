//! Poisson GLM with log link, fitted by IRLS.

use crate::config::{EstimatorConfig, ZeroFeaturePolicy};
use crate::error::EstimationError;
use crate::normal::accumulate;
use crate::transform::{term_names, LogDesign};
use crate::Estimator;
use calib_core::math::{invert_spd, ln_factorial, solve_cholesky};
use calib_core::types::{
    DesignMatrix, EstimationDiagnostics, EstimationResult, ParameterVector,
};
use std::time::Instant;

/// Lower bound of the starting mean, so all-zero responses start finite.
const MU_START_FLOOR: f64 = 0.1;

/// Poisson maximum-likelihood estimator for the log-linear rule.
///
/// Each iteration solves the weighted least-squares problem
///
/// ```text
/// (XᵀWX) β = XᵀWz,   W = diag(μ),   z = η + (y − μ) / μ
/// ```
///
/// by Cholesky factorisation, which is Newton's method on the Poisson
/// log-likelihood. Iteration starts from `μ₀ = (y + ȳ) / 2` and stops when
/// the relative change in deviance falls below the configured tolerance.
///
/// Running out of iterations, or meeting a singular or non-finite step after
/// the first iteration, yields a result with `converged = false` holding
/// the last finite estimate.
#[derive(Debug, Clone, Default)]
pub struct PoissonGlmEstimator {
    config: EstimatorConfig,
}

impl PoissonGlmEstimator {
    /// Create an estimator with a configuration.
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Estimator with default settings and the given zero-feature policy.
    pub fn with_zero_policy(policy: ZeroFeaturePolicy) -> Self {
        Self::new(EstimatorConfig::builder().zero_policy(policy).build())
    }

    /// Configuration in use.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }
}

impl Estimator for PoissonGlmEstimator {
    fn fit(
        &self,
        design: &DesignMatrix,
        responses: &[f64],
    ) -> Result<EstimationResult, EstimationError> {
        self.config.validate()?;
        let started = Instant::now();
        let log = LogDesign::build(design, responses, self.config.zero_policy)?;
        let y = &log.y;

        let y_bar = y.iter().sum::<f64>() / y.len() as f64;
        let mut mu: Vec<f64> = y
            .iter()
            .map(|&yi| ((yi + y_bar) / 2.0).max(MU_START_FLOOR))
            .collect();
        let mut eta: Vec<f64> = mu.iter().map(|m| m.ln()).collect();
        let mut dev = deviance(y, &mu);

        let mut beta: Option<Vec<f64>> = None;
        let mut converged = false;
        let mut iterations = 0;

        for iteration in 1..=self.config.max_iterations {
            let z: Vec<f64> = eta
                .iter()
                .zip(y)
                .zip(&mu)
                .map(|((e, yi), m)| e + (yi - m) / m)
                .collect();
            let normal = accumulate(&log, &mu, &z);

            let step = solve_cholesky(&normal.xtwx, &normal.xtwz)
                .filter(|b| b.iter().all(|v| v.is_finite()));
            let Some(candidate) = step else {
                if beta.is_none() {
                    return Err(EstimationError::SingularInformation);
                }
                tracing::warn!(iteration, "singular information matrix, stopping");
                break;
            };

            let eta_new = log.linear_predictor(&candidate);
            let mu_new: Vec<f64> = eta_new.iter().map(|e| e.exp()).collect();
            let dev_new = deviance(y, &mu_new);
            if !dev_new.is_finite() || mu_new.iter().any(|m| !m.is_finite() || *m <= 0.0) {
                if beta.is_none() {
                    return Err(EstimationError::NumericalBreakdown);
                }
                tracing::warn!(iteration, "non-finite step, keeping last estimate");
                break;
            }

            let change = (dev_new - dev).abs() / (dev_new.abs() + 0.1);
            tracing::trace!(iteration, deviance = dev_new, change, "irls step");

            iterations = iteration;
            beta = Some(candidate);
            eta = eta_new;
            mu = mu_new;
            dev = dev_new;

            if change < self.config.tolerance {
                converged = true;
                break;
            }
        }

        let beta = beta.ok_or(EstimationError::SingularInformation)?;

        let standard_errors = if self.config.standard_errors {
            let information = accumulate(&log, &mu, &vec![0.0; mu.len()]);
            invert_spd(&information.xtwx).and_then(|inv| {
                let se: Vec<f64> = (0..inv.len()).map(|i| inv[i][i].sqrt()).collect();
                se.iter().all(|v| v.is_finite()).then_some(se)
            })
        } else {
            None
        };

        let diagnostics = EstimationDiagnostics {
            iterations,
            log_likelihood: log_likelihood(y, &mu),
            deviance: dev,
            rows_used: log.n_rows(),
            rows_excluded: log.rows_excluded,
            rows_floored: log.rows_floored,
            duration: started.elapsed(),
        };

        let estimate = ParameterVector::new(beta);
        tracing::debug!(
            converged,
            iterations,
            deviance = dev,
            rows = log.n_rows(),
            estimate = %estimate,
            "poisson fit finished"
        );

        let result = if converged {
            EstimationResult::converged(estimate, standard_errors, diagnostics)
        } else {
            tracing::warn!(iterations, "poisson fit did not converge");
            EstimationResult::not_converged(estimate, standard_errors, diagnostics)
        };
        Ok(result.with_terms(term_names(design)))
    }
}

/// Poisson deviance `2 Σ [y ln(y/μ) − (y − μ)]`.
fn deviance(y: &[f64], mu: &[f64]) -> f64 {
    2.0 * y
        .iter()
        .zip(mu)
        .map(|(&yi, &m)| {
            let term = if yi > 0.0 { yi * (yi / m).ln() } else { 0.0 };
            term - (yi - m)
        })
        .sum::<f64>()
}

/// Poisson log-likelihood `Σ [y ln μ − μ − ln Γ(y + 1)]`.
fn log_likelihood(y: &[f64], mu: &[f64]) -> f64 {
    y.iter()
        .zip(mu)
        .map(|(&yi, &m)| {
            let term = if yi > 0.0 { yi * m.ln() } else { 0.0 };
            term - m - ln_factorial(yi)
        })
        .sum()
}
