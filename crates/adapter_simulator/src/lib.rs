//! # adapter_simulator
//!
//! Gateway to the external synapse simulator.
//!
//! Each run is given its own output directory under
//! `<OUTPUT_DIR>/runs/<session>-<iteration>-<attempt>`, leased from a shared
//! registry so that no two concurrent runs can write to the same place. The
//! per-run specification is persisted inside that directory, handed to the
//! simulator and removed as soon as the process exits.
//!
//! ## Architecture Position
//!
//! Part of the **A**dapter layer. Depends on `calib_core` and `infra_config`.
//!
//! ## Components
//!
//! - [`SimulatorGateway`]: leases run directories, runs the backend, retries
//! - [`SimulatorBackend`]: the seam to the simulator; [`ProcessBackend`]
//!   spawns the real executable
//! - [`RetryPolicy`]: bounded retry with exponential backoff
//!
//! ## Example
//!
//! ```rust,ignore
//! use adapter_simulator::{ProcessBackend, RetryPolicy, SimulationMode, SimulatorGateway};
//!
//! let gateway = SimulatorGateway::new(ProcessBackend::new("/opt/cis3d/computeSynapses"));
//! let outcome = gateway.run_with_retry(&spec, spec.parameters(), 1, &SimulationMode::Synapse, &RetryPolicy::default())?;
//! println!("outputs in {}", outcome.output_dir().display());
//! outcome.release()?;
//! ```

mod backend;
mod error;
mod gateway;
mod lease;
mod mode;
mod retry;

pub use backend::{ProcessBackend, SimulatorBackend};
pub use error::GatewayError;
pub use gateway::{RunOutcome, SimulatorGateway, RUNS_DIR};
pub use lease::{LeaseRegistry, RunLease};
pub use mode::SimulationMode;
pub use retry::RetryPolicy;
