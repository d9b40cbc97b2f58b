//! Core data types exchanged between the calibration components.
//!
//! This module provides:
//! - `parameters`: The connectivity-rule parameter vector θ
//! - `synapse`: Synapse records, design matrices and observation sets
//! - `statistics`: Summary statistic results with their status flags
//! - `estimation`: Estimation results and fit diagnostics
//! - `error`: Structured error types for data-model invariants
//!
//! # Re-exports
//!
//! Commonly used types are re-exported at this module level.

pub mod error;
pub mod estimation;
pub mod parameters;
pub mod statistics;
pub mod synapse;

pub use error::DataError;
pub use estimation::{EstimationDiagnostics, EstimationResult};
pub use parameters::ParameterVector;
pub use statistics::{StatisticResult, StatisticStatus};
pub use synapse::{DesignMatrix, ObservationSet, PairKey, SynapseRecord};
