//! # calib_estimator
//!
//! Maximum-likelihood estimation of the connectivity rule parameters.
//!
//! The observation model is a Poisson GLM with log link on log-transformed
//! features:
//!
//! ```text
//! count ~ Poisson(μ),   ln μ = θ₀ + θ₁ ln x₁ + … + θₚ ln xₚ
//! ```
//!
//! fitted by iteratively reweighted least squares. Zero-valued features are
//! handled by an explicit [`ZeroFeaturePolicy`] before taking logarithms.
//!
//! ## Architecture Position
//!
//! Part of the **C**alibration layer. Depends only on `calib_core`.
//!
//! ## Feature Flags
//!
//! - `parallel` (default): accumulate the normal equations with `rayon` on
//!   large tables
//!
//! ## Example
//!
//! ```
//! use calib_core::types::DesignMatrix;
//! use calib_estimator::{Estimator, PoissonGlmEstimator};
//!
//! let design = DesignMatrix::from_rows(
//!     vec!["pre".into()],
//!     &[vec![1.0], vec![2.0], vec![4.0], vec![8.0]],
//! ).unwrap();
//! // count = 2 · pre
//! let counts = [2.0, 4.0, 8.0, 16.0];
//!
//! let result = PoissonGlmEstimator::default().fit(&design, &counts).unwrap();
//! assert!(result.converged);
//! assert!((result.estimate[0] - 2.0_f64.ln()).abs() < 1e-8);
//! assert!((result.estimate[1] - 1.0).abs() < 1e-8);
//! ```

mod config;
mod error;
mod normal;
mod poisson;
mod transform;

pub use config::{EstimatorConfig, EstimatorConfigBuilder, ZeroFeaturePolicy};
pub use error::EstimationError;
pub use poisson::PoissonGlmEstimator;

use calib_core::types::{DesignMatrix, EstimationResult, ObservationSet};

/// A maximum-likelihood fit of the observation model.
///
/// Implementations are stateless: fitting the same inputs twice gives the
/// same result.
pub trait Estimator {
    /// Fit the model to raw (untransformed) features and counts.
    fn fit(
        &self,
        design: &DesignMatrix,
        responses: &[f64],
    ) -> Result<EstimationResult, EstimationError>;

    /// Fit an aligned observation set.
    fn fit_observations(
        &self,
        observations: &ObservationSet,
    ) -> Result<EstimationResult, EstimationError> {
        self.fit(&observations.design, &observations.responses)
    }
}
