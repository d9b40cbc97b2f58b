//! Proposal, stopping and failed-statistic policies.

use calib_core::types::{EstimationResult, ParameterVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How the next parameter vector is chosen from the latest estimate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ProposalPolicy {
    /// The estimate becomes the next θ.
    #[default]
    UseEstimate,
    /// Move a fraction α ∈ (0, 1] of the way: θ + α(θ̂ − θ).
    Damped(f64),
    /// Always propose the initial θ; the estimator only scores it.
    Fixed,
}

impl ProposalPolicy {
    /// Next θ. Falls back to `current` when the estimate has a different
    /// length or the step is not finite.
    pub fn propose(
        &self,
        current: &ParameterVector,
        estimate: &ParameterVector,
        initial: &ParameterVector,
    ) -> ParameterVector {
        let next = match self {
            ProposalPolicy::UseEstimate => Some(estimate.clone()),
            ProposalPolicy::Damped(alpha) => current.step_towards(estimate, *alpha),
            ProposalPolicy::Fixed => Some(initial.clone()),
        };
        match next {
            Some(p) if p.len() == current.len() && p.is_finite() => p,
            _ => {
                tracing::warn!(policy = ?self, "unusable proposal, keeping current parameters");
                current.clone()
            }
        }
    }
}

type StopFn = dyn Fn(&EstimationResult, &ParameterVector) -> bool + Send + Sync;

/// When the loop declares convergence.
#[derive(Clone)]
pub enum StoppingRule {
    /// `max |θ̂ − θ| < tol`, with θ the parameters just simulated.
    ParameterTolerance(f64),
    /// Stop once this many iterations have completed.
    AfterIterations(usize),
    /// Caller-supplied predicate over the latest estimate and θ.
    Custom(Arc<StopFn>),
}

impl StoppingRule {
    /// Wrap a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&EstimationResult, &ParameterVector) -> bool + Send + Sync + 'static,
    {
        StoppingRule::Custom(Arc::new(f))
    }

    /// Evaluate after `iteration` (1-based) completed.
    pub fn should_stop(
        &self,
        iteration: usize,
        result: &EstimationResult,
        proposed: &ParameterVector,
    ) -> bool {
        match self {
            StoppingRule::ParameterTolerance(tol) => result
                .estimate
                .max_abs_diff(proposed)
                .map(|d| d < *tol)
                .unwrap_or(false),
            StoppingRule::AfterIterations(n) => iteration >= *n,
            StoppingRule::Custom(f) => f(result, proposed),
        }
    }
}

impl Default for StoppingRule {
    fn default() -> Self {
        StoppingRule::ParameterTolerance(1e-6)
    }
}

impl fmt::Debug for StoppingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoppingRule::ParameterTolerance(tol) => {
                f.debug_tuple("ParameterTolerance").field(tol).finish()
            }
            StoppingRule::AfterIterations(n) => f.debug_tuple("AfterIterations").field(n).finish(),
            StoppingRule::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Reaction to summary statistics reported as FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticFailurePolicy {
    /// Log and record, keep iterating.
    #[default]
    Continue,
    /// End the session as failed.
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;
    use calib_core::types::EstimationDiagnostics;

    fn pv(v: &[f64]) -> ParameterVector {
        ParameterVector::new(v.to_vec())
    }

    fn result(estimate: &[f64]) -> EstimationResult {
        EstimationResult::converged(pv(estimate), None, EstimationDiagnostics::default())
    }

    #[test]
    fn test_damped_proposal() {
        let next = ProposalPolicy::Damped(0.5).propose(&pv(&[0.0, 2.0]), &pv(&[1.0, 0.0]), &pv(&[9.0, 9.0]));
        assert_eq!(next.as_slice(), &[0.5, 1.0]);
    }

    #[test]
    fn test_fixed_proposal_returns_initial() {
        let next = ProposalPolicy::Fixed.propose(&pv(&[1.0]), &pv(&[2.0]), &pv(&[3.0]));
        assert_eq!(next.as_slice(), &[3.0]);
    }

    #[test]
    fn test_non_finite_estimate_keeps_current() {
        let next = ProposalPolicy::UseEstimate.propose(&pv(&[1.0]), &pv(&[f64::NAN]), &pv(&[0.0]));
        assert_eq!(next.as_slice(), &[1.0]);
    }

    #[test]
    fn test_parameter_tolerance() {
        let rule = StoppingRule::ParameterTolerance(1e-3);
        assert!(rule.should_stop(1, &result(&[1.0, 2.0]), &pv(&[1.0, 2.0005])));
        assert!(!rule.should_stop(1, &result(&[1.0, 2.0]), &pv(&[1.0, 2.01])));
    }

    #[test]
    fn test_custom_rule() {
        let rule = StoppingRule::custom(|r, _| r.estimate[0] > 0.0);
        assert!(rule.should_stop(1, &result(&[0.5]), &pv(&[0.0])));
        assert_eq!(format!("{:?}", rule), "Custom(..)");
    }
}
