//! # calib_core: Data Model and Numerics for Connectivity-Rule Calibration
//!
//! ## Layer 1 (Foundation) Role
//!
//! calib_core is the bottom layer of the calibration workspace, providing:
//! - Parameter vectors for the connectivity rule (`types::parameters`)
//! - Synapse records, design matrices and observation sets (`types::synapse`)
//! - Summary statistic results reported by the simulator (`types::statistics`)
//! - Estimation results and diagnostics (`types::estimation`)
//! - Dense symmetric linear algebra and special functions (`math`)
//! - A synthetic Poisson synapse generator for tests and demos (`synthetic`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other workspace crates. It does not know
//! about files, processes or configuration; those live in the adapter and
//! infra crates.
//!
//! ## Usage Examples
//!
//! ```rust
//! use calib_core::types::{ParameterVector, SynapseRecord};
//!
//! let theta = ParameterVector::new(vec![0.0, 1.0, 1.0, -1.0]);
//! assert_eq!(theta.len(), 4);
//!
//! let record = SynapseRecord::new(1, 2, 3.0, vec![4.0, 2.0, 8.0]);
//! assert_eq!(record.pair_key(), (None, 1, 2));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod math;
pub mod synthetic;
pub mod types;
