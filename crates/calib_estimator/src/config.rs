//! Estimator configuration.

use crate::error::EstimationError;

/// Default value zero features are raised to.
pub const DEFAULT_FEATURE_FLOOR: f64 = 1e-12;

/// How features `≤ 0` are treated before taking logarithms.
///
/// # Variants
///
/// - `Floor(v)`: replace the feature by `v` (deterministic; keeps the row)
/// - `ExcludeRow`: drop the row from the fit and count it
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZeroFeaturePolicy {
    /// Replace non-positive features by the given positive value.
    Floor(f64),
    /// Drop rows with any non-positive feature.
    ExcludeRow,
}

impl Default for ZeroFeaturePolicy {
    fn default() -> Self {
        ZeroFeaturePolicy::Floor(DEFAULT_FEATURE_FLOOR)
    }
}

/// Configuration for [`PoissonGlmEstimator`](crate::PoissonGlmEstimator).
///
/// # Examples
///
/// ```
/// use calib_estimator::{EstimatorConfig, ZeroFeaturePolicy};
///
/// let config = EstimatorConfig::builder()
///     .tolerance(1e-10)
///     .max_iterations(50)
///     .zero_policy(ZeroFeaturePolicy::ExcludeRow)
///     .build();
/// assert_eq!(config.max_iterations, 50);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Maximum IRLS iterations.
    /// Default: 100
    pub max_iterations: usize,

    /// Relative deviance change below which the fit has converged:
    /// `|D - D_prev| / (|D| + 0.1) < tolerance`.
    /// Default: 1e-8
    pub tolerance: f64,

    /// Zero-feature handling.
    /// Default: `Floor(1e-12)`
    pub zero_policy: ZeroFeaturePolicy,

    /// Compute standard errors at the final estimate.
    /// Default: true
    pub standard_errors: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-8,
            zero_policy: ZeroFeaturePolicy::default(),
            standard_errors: true,
        }
    }
}

impl EstimatorConfig {
    /// Create a configuration builder.
    pub fn builder() -> EstimatorConfigBuilder {
        EstimatorConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), EstimationError> {
        if self.max_iterations == 0 {
            return Err(EstimationError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EstimationError::InvalidConfig(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if let ZeroFeaturePolicy::Floor(v) = self.zero_policy {
            if !v.is_finite() || v <= 0.0 {
                return Err(EstimationError::InvalidConfig(format!(
                    "floor value must be positive, got {}",
                    v
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`EstimatorConfig`].
#[derive(Debug, Clone, Default)]
pub struct EstimatorConfigBuilder {
    config: EstimatorConfig,
}

impl EstimatorConfigBuilder {
    /// Set the maximum iterations.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Set the zero-feature policy.
    pub fn zero_policy(mut self, policy: ZeroFeaturePolicy) -> Self {
        self.config.zero_policy = policy;
        self
    }

    /// Enable or disable standard errors.
    pub fn standard_errors(mut self, enabled: bool) -> Self {
        self.config.standard_errors = enabled;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EstimatorConfig {
        self.config
    }
}
