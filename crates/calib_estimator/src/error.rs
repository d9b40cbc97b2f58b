//! Estimation errors.

use thiserror::Error;

/// Errors for inputs the estimator cannot use.
///
/// Failing to converge is not an error; see
/// [`EstimationResult::converged`](calib_core::types::EstimationResult).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    /// Design rows and responses are not aligned.
    #[error("Dimension mismatch: {rows} design rows, {responses} responses")]
    DimensionMismatch {
        /// Number of design rows
        rows: usize,
        /// Number of responses
        responses: usize,
    },

    /// A response is negative or not finite.
    #[error("Invalid response {value} at row {row}: counts must be finite and non-negative")]
    InvalidResponse {
        /// Zero-based row index
        row: usize,
        /// Offending value
        value: f64,
    },

    /// A feature value is not finite.
    #[error("Invalid feature '{column}' at row {row}: {value}")]
    InvalidFeature {
        /// Zero-based row index
        row: usize,
        /// Feature column name
        column: String,
        /// Offending value
        value: f64,
    },

    /// Fewer usable rows than parameters.
    #[error("Insufficient data: need at least {required} usable rows, got {provided}")]
    InsufficientData {
        /// Number of parameters
        required: usize,
        /// Usable rows after the zero-feature policy
        provided: usize,
    },

    /// The information matrix is singular at the starting point.
    #[error("Singular information matrix at the starting point (collinear or constant features)")]
    SingularInformation,

    /// The first step from the starting point was not finite.
    #[error("Numerical breakdown in the first iteration (features too extreme for a finite fit)")]
    NumericalBreakdown,

    /// Invalid estimator configuration.
    #[error("Invalid estimator configuration: {0}")]
    InvalidConfig(String),
}
