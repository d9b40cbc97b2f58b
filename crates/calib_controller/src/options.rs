//! Controller options and their derivation from session settings.

use crate::policy::{ProposalPolicy, StatisticFailurePolicy, StoppingRule};
use adapter_simulator::{RetryPolicy, SimulationMode};
use calib_core::types::ParameterVector;
use calib_estimator::{EstimatorConfig, ZeroFeaturePolicy};
use infra_config::{FailureAction, SessionSettings, ZeroPolicyKind};
use std::time::Duration;

/// Options steering one calibration session.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Iteration budget.
    pub max_iterations: usize,
    /// Optional wall-clock budget, checked before each iteration.
    pub max_wall_time: Option<Duration>,
    /// How the next parameters are derived from an estimate.
    pub proposal: ProposalPolicy,
    /// Convergence test applied after each iteration.
    pub stopping: StoppingRule,
    /// Reaction to a `Failed` summary statistic.
    pub statistic_failure: StatisticFailurePolicy,
    /// Retries of a failed simulator run within one iteration.
    pub retry: RetryPolicy,
    /// Mode token passed to the simulator as its first argument.
    pub mode: SimulationMode,
    /// Starting parameters; the template's parameters when `None`.
    pub initial: Option<ParameterVector>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            max_wall_time: None,
            proposal: ProposalPolicy::default(),
            stopping: StoppingRule::default(),
            statistic_failure: StatisticFailurePolicy::default(),
            retry: RetryPolicy::default(),
            mode: SimulationMode::default(),
            initial: None,
        }
    }
}

impl ControllerOptions {
    /// Options from session settings.
    pub fn from_settings(settings: &SessionSettings) -> Self {
        let calibration = &settings.calibration;
        let proposal = if calibration.damping < 1.0 {
            ProposalPolicy::Damped(calibration.damping)
        } else {
            ProposalPolicy::UseEstimate
        };
        let statistic_failure = match calibration.statistic_failure {
            FailureAction::Continue => StatisticFailurePolicy::Continue,
            FailureAction::Abort => StatisticFailurePolicy::Abort,
        };
        let mode = settings
            .simulator
            .mode
            .parse()
            .unwrap_or(SimulationMode::Synapse);

        Self {
            max_iterations: calibration.max_iterations,
            max_wall_time: calibration.max_wall_time_secs.map(Duration::from_secs),
            proposal,
            stopping: StoppingRule::ParameterTolerance(calibration.tolerance),
            statistic_failure,
            retry: RetryPolicy {
                max_retries: settings.retry.max_retries,
                backoff: Duration::from_millis(settings.retry.backoff_ms),
                backoff_multiplier: settings.retry.backoff_multiplier,
            },
            mode,
            initial: None,
        }
    }

    /// Set the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the wall-clock budget.
    pub fn with_max_wall_time(mut self, limit: Duration) -> Self {
        self.max_wall_time = Some(limit);
        self
    }

    /// Set the proposal policy.
    pub fn with_proposal(mut self, proposal: ProposalPolicy) -> Self {
        self.proposal = proposal;
        self
    }

    /// Set the stopping rule.
    pub fn with_stopping(mut self, stopping: StoppingRule) -> Self {
        self.stopping = stopping;
        self
    }

    /// Set the reaction to failed statistics.
    pub fn with_statistic_failure(mut self, policy: StatisticFailurePolicy) -> Self {
        self.statistic_failure = policy;
        self
    }

    /// Set the simulator retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the simulator mode.
    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Start from `initial` instead of the template's parameters.
    pub fn with_initial(mut self, initial: ParameterVector) -> Self {
        self.initial = Some(initial);
        self
    }
}

/// Estimator configuration from session settings.
pub fn estimator_config(settings: &SessionSettings) -> EstimatorConfig {
    let estimator = &settings.estimator;
    let zero_policy = match estimator.zero_policy {
        ZeroPolicyKind::Floor => ZeroFeaturePolicy::Floor(estimator.floor_value),
        ZeroPolicyKind::Exclude => ZeroFeaturePolicy::ExcludeRow,
    };
    EstimatorConfig::builder()
        .max_iterations(estimator.max_iterations)
        .tolerance(estimator.tolerance)
        .zero_policy(zero_policy)
        .build()
}
