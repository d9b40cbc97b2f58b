//! # calib_controller
//!
//! The calibration loop for the connectivity rule.
//!
//! Each iteration hands the current parameters to the simulator through a
//! transient specification, collects the synapse table and summary
//! statistics from the run directory, fits the observation model and
//! proposes the next parameters:
//!
//! ```text
//! θ ──► SimulatorGateway ──► ResultCollector ──► Estimator ──► θ̂
//! ▲                                                          │
//! └──────────────────── ProposalPolicy ◄─────────────────────┘
//! ```
//!
//! The session ends when the [`StoppingRule`] holds (`Converged`), a budget
//! is spent (`IterationBudgetExhausted`) or an unrecovered error occurs
//! (`Failed`). Every outcome produces a [`SessionReport`].
//!
//! ## Architecture Position
//!
//! Top of the **C**alibration layer; wires together `infra_config`,
//! `adapter_simulator`, `adapter_loader` and `calib_estimator`.

#![deny(missing_docs)]

mod controller;
mod error;
mod options;
mod policy;
mod report;
mod state;

pub use controller::CalibrationController;
pub use error::{ControllerError, FailureKind};
pub use options::{estimator_config, ControllerOptions};
pub use policy::{ProposalPolicy, StatisticFailurePolicy, StoppingRule};
pub use report::{FailureRecord, IterationRecord, SessionReport};
pub use state::{Budget, ControllerState};
