//! Connectivity-rule parameter vector.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// Ordered, fixed-length vector of connectivity-rule parameters θ.
///
/// Index 0 is the intercept; index `i > 0` is the weight of the i-th
/// log-transformed feature. The vector is a value type: callers copy it
/// when handing it to another component and never mutate a shared instance.
///
/// # Example
///
/// ```
/// use calib_core::types::ParameterVector;
///
/// let a = ParameterVector::new(vec![0.0, 1.0, 1.0, -1.0]);
/// let b = ParameterVector::new(vec![0.0, 1.5, 1.0, -1.0]);
/// assert_eq!(a.max_abs_diff(&b), Some(0.5));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterVector(Vec<f64>);

impl ParameterVector {
    /// Create a parameter vector from its values.
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Create a zero vector of length `k`.
    pub fn zeros(k: usize) -> Self {
        Self(vec![0.0; k])
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector holds no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the values.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consume into the underlying values.
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// Iterate over the values.
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// Whether every value is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Largest absolute component-wise difference.
    ///
    /// Returns `None` when the vectors have different lengths and `NaN`
    /// when any component is `NaN`.
    pub fn max_abs_diff(&self, other: &ParameterVector) -> Option<f64> {
        if self.len() != other.len() {
            return None;
        }
        Some(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0_f64, |acc, d| {
                    if acc.is_nan() || d.is_nan() {
                        f64::NAN
                    } else {
                        acc.max(d)
                    }
                }),
        )
    }

    /// Move a fraction `alpha` of the way towards `target`.
    ///
    /// `alpha = 1` returns `target`, `alpha = 0` returns `self`.
    /// Returns `None` when the lengths differ.
    pub fn step_towards(&self, target: &ParameterVector, alpha: f64) -> Option<ParameterVector> {
        if self.len() != target.len() {
            return None;
        }
        Some(ParameterVector(
            self.0
                .iter()
                .zip(&target.0)
                .map(|(p, t)| p + alpha * (t - p))
                .collect(),
        ))
    }
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl AsRef<[f64]> for ParameterVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl Index<usize> for ParameterVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl fmt::Display for ParameterVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.6}", v)?;
        }
        write!(f, "]")
    }
}
