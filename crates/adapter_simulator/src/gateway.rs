//! Simulator gateway.

use crate::backend::SimulatorBackend;
use crate::error::GatewayError;
use crate::lease::{LeaseRegistry, RunLease};
use crate::mode::SimulationMode;
use crate::retry::RetryPolicy;
use calib_core::types::ParameterVector;
use infra_config::{CalibrationSpec, ConfigurationStore, TransientSpec};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Subdirectory of `OUTPUT_DIR` holding per-run directories.
pub const RUNS_DIR: &str = "runs";

/// A finished, successful simulator run.
///
/// Holds the lease on the run directory until the caller has collected the
/// outputs and calls [`release`](Self::release) (or drops the outcome).
#[derive(Debug)]
pub struct RunOutcome {
    lease: RunLease,
    iteration: usize,
    attempts: u32,
    duration: Duration,
}

impl RunOutcome {
    /// Directory the simulator wrote `synapses.csv` and
    /// `summaryStatistics.json` into.
    pub fn output_dir(&self) -> &Path {
        self.lease.dir()
    }

    /// Iteration this run belongs to.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Attempts used, including the successful one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wall time of the successful attempt.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Release the run directory.
    pub fn release(self) -> Result<(), GatewayError> {
        self.lease.release()
    }
}

/// Runs the simulator in isolated, leased directories.
pub struct SimulatorGateway {
    backend: Box<dyn SimulatorBackend>,
    registry: LeaseRegistry,
    session_id: String,
    keep_outputs: bool,
}

impl SimulatorGateway {
    /// Create a gateway with a fresh session id and its own lease registry.
    pub fn new(backend: impl SimulatorBackend + 'static) -> Self {
        let session = Uuid::new_v4().simple().to_string();
        Self {
            backend: Box::new(backend),
            registry: LeaseRegistry::new(),
            session_id: session[..8].to_string(),
            keep_outputs: true,
        }
    }

    /// Use a caller-chosen session id in run directory names.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Share a lease registry with other gateways.
    pub fn with_registry(mut self, registry: LeaseRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Keep or remove run directories when their lease ends.
    pub fn keep_outputs(mut self, keep: bool) -> Self {
        self.keep_outputs = keep;
        self
    }

    /// Session id used in run directory names.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The lease registry.
    pub fn registry(&self) -> &LeaseRegistry {
        &self.registry
    }

    /// Run directory for an attempt: `<base>/runs/<session>-<iteration>-<attempt>`.
    pub fn run_dir(&self, base: &Path, iteration: usize, attempt: u32) -> PathBuf {
        base.join(RUNS_DIR)
            .join(format!("{}-{}-{}", self.session_id, iteration, attempt))
    }

    /// Run the simulator once for `transient`.
    ///
    /// The run writes into its own leased directory below the snapshot's
    /// output directory; the snapshot file is removed when the process exits,
    /// whether it succeeded or not.
    pub fn run(
        &self,
        transient: TransientSpec,
        mode: &SimulationMode,
        iteration: usize,
    ) -> Result<RunOutcome, GatewayError> {
        self.run_attempt(transient, mode, iteration, 1)
    }

    /// Run with bounded retry of simulator failures.
    ///
    /// Every attempt gets a fresh snapshot of `template` with `parameters`
    /// and a fresh run directory. Errors other than
    /// [`GatewayError::SimulationFailed`] are returned immediately.
    pub fn run_with_retry(
        &self,
        template: &CalibrationSpec,
        parameters: &ParameterVector,
        iteration: usize,
        mode: &SimulationMode,
        policy: &RetryPolicy,
    ) -> Result<RunOutcome, GatewayError> {
        let max_attempts = policy.max_attempts();
        let mut attempt = 1;
        loop {
            let transient = ConfigurationStore::snapshot(template, parameters.clone())?;
            match self.run_attempt(transient, mode, iteration, attempt) {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        iteration,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "simulation attempt failed, retrying"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(iteration, attempts = attempt, error = %e, "retry budget exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }

    fn run_attempt(
        &self,
        transient: TransientSpec,
        mode: &SimulationMode,
        iteration: usize,
        attempt: u32,
    ) -> Result<RunOutcome, GatewayError> {
        // The simulator runs inside the run directory, so every path it is
        // handed must not depend on the caller's working directory.
        let relative = self.run_dir(transient.output_dir(), iteration, attempt);
        let dir = std::path::absolute(&relative).map_err(|e| GatewayError::io(&relative, e))?;
        let lease = self.registry.acquire(dir.clone(), self.keep_outputs)?;
        let mut transient = transient.with_output_dir(&dir);
        let spec_path = transient.persist(&dir)?.to_path_buf();

        tracing::info!(
            backend = self.backend.name(),
            iteration,
            attempt,
            mode = %mode,
            dir = %dir.display(),
            "running simulator"
        );
        let started = Instant::now();
        let result = self.backend.execute(mode, &spec_path, lease.dir());
        let duration = started.elapsed();

        let released = transient.release();
        result?;
        released?;

        tracing::info!(
            iteration,
            attempt,
            elapsed_ms = duration.as_millis() as u64,
            "simulator finished"
        );
        Ok(RunOutcome {
            lease,
            iteration,
            attempts: attempt,
            duration,
        })
    }
}

impl std::fmt::Debug for SimulatorGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatorGateway")
            .field("backend", &self.backend.name())
            .field("session_id", &self.session_id)
            .field("keep_outputs", &self.keep_outputs)
            .finish()
    }
}
