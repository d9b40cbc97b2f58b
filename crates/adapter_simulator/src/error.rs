//! Gateway errors.

use infra_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the simulator.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The simulator exited unsuccessfully.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    #[error("Simulation failed (exit code {}): {stderr}", exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    SimulationFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The simulator process could not be started.
    #[error("Failed to start simulator '{binary}': {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another run currently holds the output directory.
    #[error("Output directory already leased: {0}")]
    OutputDirInUse(PathBuf),

    /// Preparing or cleaning up a run directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run specification could not be written.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GatewayError {
    /// Create a simulation failure.
    pub fn simulation_failed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        GatewayError::SimulationFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GatewayError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// Only simulator failures are retried; configuration and environment
    /// problems would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::SimulationFailed { .. })
    }
}
