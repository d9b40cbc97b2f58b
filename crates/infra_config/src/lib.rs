//! # infra_config
//!
//! Calibration specification store and session settings.
//!
//! This crate loads the simulator's JSON specification (the immutable
//! calibration template), derives per-iteration transient snapshots with a
//! replaced parameter vector, and loads the session settings that steer the
//! calibration loop (TOML file layered with environment variables).
//!
//! ## Architecture Position
//!
//! Part of the **I**nfra layer. Depends only on `calib_core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use infra_config::ConfigurationStore;
//! use calib_core::types::ParameterVector;
//!
//! let spec = ConfigurationStore::load("synapseSpec.json")?;
//! let mut transient = ConfigurationStore::snapshot(&spec, ParameterVector::new(vec![0.0, 1.0, 1.0, -1.0]))?;
//! transient.persist(std::path::Path::new("/tmp/run-1"))?;
//! ConfigurationStore::release(transient)?;
//! ```

mod error;
mod settings;
mod spec;
mod store;
mod transient;

pub use error::ConfigError;
pub use settings::{
    CalibrationSettings, EstimatorSettings, FailureAction, LogLevel, LoggingSettings,
    RetrySettings, SessionSettings, SimulatorSettings, ZeroPolicyKind,
};
pub use spec::{
    CalibrationSpec, StatisticRequest, OUTPUT_DIR_KEY, PARAMETERS_KEY, STATISTICS_KEY,
    STATISTICS_KEY_ALIAS,
};
pub use store::ConfigurationStore;
pub use transient::TransientSpec;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{CalibrationSpec, ConfigError, ConfigurationStore, SessionSettings, TransientSpec};
}
