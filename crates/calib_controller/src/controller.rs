//! The calibration loop.

use crate::error::ControllerError;
use crate::options::ControllerOptions;
use crate::policy::{ProposalPolicy, StatisticFailurePolicy};
use crate::report::{FailureRecord, IterationRecord, SessionReport};
use crate::state::{Budget, ControllerState};
use adapter_loader::{LoaderError, ResultCollector};
use adapter_simulator::SimulatorGateway;
use calib_core::types::{
    EstimationResult, ObservationSet, ParameterVector, StatisticResult, StatisticStatus,
};
use calib_estimator::{Estimator, PoissonGlmEstimator};
use chrono::Utc;
use infra_config::CalibrationSpec;
use std::path::Path;
use std::time::Instant;

/// Drives propose → simulate → collect → estimate until a stopping rule,
/// a budget or an error ends the session.
///
/// # Example
///
/// ```rust,ignore
/// use calib_controller::{CalibrationController, ControllerOptions};
///
/// let mut controller = CalibrationController::new(spec, gateway, ResultCollector::default())
///     .with_options(ControllerOptions::default().with_max_iterations(5));
/// let report = controller.run();
/// println!("{} after {} iterations", report.state, report.iteration_count());
/// ```
pub struct CalibrationController<E = PoissonGlmEstimator> {
    spec: CalibrationSpec,
    gateway: SimulatorGateway,
    collector: ResultCollector,
    estimator: E,
    options: ControllerOptions,
    state: ControllerState,
}

/// Result of one completed iteration.
struct Step {
    record: IterationRecord,
    result: EstimationResult,
}

enum Exit {
    Converged,
    Budget(Budget),
    Failed(ControllerError, Option<usize>),
}

impl CalibrationController<PoissonGlmEstimator> {
    /// Controller with the default Poisson estimator.
    pub fn new(spec: CalibrationSpec, gateway: SimulatorGateway, collector: ResultCollector) -> Self {
        Self::with_estimator(spec, gateway, collector, PoissonGlmEstimator::default())
    }
}

impl<E: Estimator> CalibrationController<E> {
    /// Controller with a custom estimator.
    pub fn with_estimator(
        spec: CalibrationSpec,
        gateway: SimulatorGateway,
        collector: ResultCollector,
        estimator: E,
    ) -> Self {
        Self {
            spec,
            gateway,
            collector,
            estimator,
            options: ControllerOptions::default(),
            state: ControllerState::Initialized,
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Current state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Options in use.
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Run the session to a terminal state.
    ///
    /// Errors do not escape: they end the session in
    /// [`ControllerState::Failed`] and are described in the report.
    pub fn run(&mut self) -> SessionReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        let session = self.gateway.session_id().to_string();
        let span = tracing::info_span!("session", id = %session);
        let _guard = span.enter();

        let initial = self
            .options
            .initial
            .clone()
            .unwrap_or_else(|| self.spec.parameters().clone());

        let mut history: Vec<IterationRecord> = Vec::new();
        let mut last: Option<EstimationResult> = None;

        let exit = match self.validate(&initial) {
            Err(e) => Exit::Failed(e, None),
            Ok(()) => {
                tracing::info!(
                    initial = %initial,
                    max_iterations = self.options.max_iterations,
                    "calibration session started"
                );
                self.iterate(&initial, clock, &mut history, &mut last)
            }
        };

        let (state, budget, failure) = match exit {
            Exit::Converged => (ControllerState::Converged, None, None),
            Exit::Budget(b) => (ControllerState::IterationBudgetExhausted, Some(b), None),
            Exit::Failed(e, iteration) => {
                tracing::error!(error = %e, "calibration session failed");
                (
                    ControllerState::Failed,
                    None,
                    Some(FailureRecord::from_error(&e, iteration)),
                )
            }
        };
        self.transition(state);

        let final_parameters = last
            .as_ref()
            .map(|r| r.estimate.clone())
            .unwrap_or_else(|| initial.clone());
        tracing::info!(
            state = %state,
            iterations = history.len(),
            final_parameters = %final_parameters,
            elapsed_ms = clock.elapsed().as_millis() as u64,
            "calibration session finished"
        );

        SessionReport {
            session_id: session,
            state,
            budget,
            failure,
            initial_parameters: initial,
            final_parameters,
            last_estimate: last,
            iterations: history,
            started_at,
            finished_at: Utc::now(),
        }
    }

    fn validate(&self, initial: &ParameterVector) -> Result<(), ControllerError> {
        if self.options.max_iterations == 0 {
            return Err(ControllerError::InvalidOptions(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if initial.len() != self.spec.parameters().len() || !initial.is_finite() {
            return Err(ControllerError::InvalidOptions(format!(
                "initial parameters {} do not match the specification ({} finite values)",
                initial,
                self.spec.parameters().len()
            )));
        }
        if let ProposalPolicy::Damped(alpha) = self.options.proposal {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err(ControllerError::InvalidOptions(format!(
                    "damping factor must lie in (0, 1], got {}",
                    alpha
                )));
            }
        }
        Ok(())
    }

    fn iterate(
        &mut self,
        initial: &ParameterVector,
        clock: Instant,
        history: &mut Vec<IterationRecord>,
        last: &mut Option<EstimationResult>,
    ) -> Exit {
        let mut theta = initial.clone();

        for iteration in 1..=self.options.max_iterations {
            if let Some(limit) = self.options.max_wall_time {
                if clock.elapsed() >= limit {
                    tracing::warn!(iteration, limit_secs = limit.as_secs_f64(), "wall-clock budget spent");
                    return Exit::Budget(Budget::WallClock);
                }
            }

            let span = tracing::info_span!("iteration", n = iteration);
            let _guard = span.enter();

            let step = match self.step(iteration, &theta) {
                Ok(step) => step,
                Err(e) => return Exit::Failed(e, Some(iteration)),
            };

            let stop = self
                .options
                .stopping
                .should_stop(iteration, &step.result, &theta);
            let next = self
                .options
                .proposal
                .propose(&theta, &step.result.estimate, initial);

            tracing::info!(
                proposed = %theta,
                estimate = %step.result.estimate,
                stop,
                "iteration complete"
            );

            history.push(step.record);
            *last = Some(step.result);

            if stop {
                return Exit::Converged;
            }
            theta = next;
        }

        Exit::Budget(Budget::Iterations)
    }

    fn step(&mut self, iteration: usize, theta: &ParameterVector) -> Result<Step, ControllerError> {
        self.transition(ControllerState::Proposing);
        tracing::debug!(theta = %theta, "proposing");

        self.transition(ControllerState::Simulating);
        let outcome = self.gateway.run_with_retry(
            &self.spec,
            theta,
            iteration,
            &self.options.mode,
            &self.options.retry,
        )?;
        let attempts = outcome.attempts();

        self.transition(ControllerState::Collecting);
        let collected = self.collect(iteration, outcome.output_dir());
        if let Err(e) = outcome.release() {
            tracing::warn!(error = %e, "failed to release run directory");
        }
        let (statistics, observations) = collected?;

        self.transition(ControllerState::Estimating);
        let result = self.estimator.fit_observations(&observations)?;

        let flagged_statistics = statistics
            .iter()
            .filter(|s| s.is_flagged())
            .map(|s| s.name.clone())
            .collect();
        let record = IterationRecord {
            iteration,
            proposed: theta.clone(),
            estimate: result.estimate.clone(),
            estimator_converged: result.converged,
            attempts,
            rows_used: result.diagnostics.rows_used,
            deviance: result.diagnostics.deviance,
            statistics,
            flagged_statistics,
        };
        Ok(Step { record, result })
    }

    fn collect(
        &self,
        iteration: usize,
        run_dir: &Path,
    ) -> Result<(Vec<StatisticResult>, ObservationSet), ControllerError> {
        let mut statistics = match self.collector.collect_summary_statistics(run_dir) {
            Ok(stats) => stats,
            Err(LoaderError::FileNotFound(_)) if self.spec.statistic_definitions().is_empty() => {
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        // Requested but absent from the report counts as failed.
        let missing: Vec<String> = self
            .spec
            .statistic_definitions()
            .iter()
            .filter(|req| !statistics.iter().any(|s| s.name == req.name))
            .map(|req| req.name.clone())
            .collect();
        if !missing.is_empty() {
            tracing::warn!(statistics = ?missing, "requested statistics not reported");
            statistics.extend(missing.into_iter().map(|name| {
                StatisticResult::new(name, StatisticStatus::Failed, None).with_message("not reported")
            }));
        }

        let failed: Vec<String> = statistics
            .iter()
            .filter(|s| s.status == StatisticStatus::Failed)
            .map(|s| s.name.clone())
            .collect();
        if !failed.is_empty() {
            match self.options.statistic_failure {
                StatisticFailurePolicy::Abort => {
                    return Err(ControllerError::StatisticFailed {
                        iteration,
                        names: failed,
                    })
                }
                StatisticFailurePolicy::Continue => {
                    tracing::warn!(statistics = ?failed, "summary statistics failed, continuing");
                }
            }
        }

        let records = self.collector.collect_synapses(run_dir)?;
        let observations = self.collector.to_observations(&records)?;
        tracing::debug!(rows = observations.len(), "simulator outputs collected");
        Ok((statistics, observations))
    }

    fn transition(&mut self, next: ControllerState) {
        tracing::trace!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}
