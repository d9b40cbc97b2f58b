//! Log transform of the raw design with the zero-feature guard.

use crate::config::ZeroFeaturePolicy;
use crate::error::EstimationError;
use calib_core::types::DesignMatrix;

/// Model matrix `[1, ln x₁, …, ln xₚ]` (row-major) and matching responses.
#[derive(Debug, Clone)]
pub(crate) struct LogDesign {
    /// Row-major model matrix, `n_rows × n_params`.
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub n_params: usize,
    pub rows_excluded: usize,
    pub rows_floored: usize,
}

impl LogDesign {
    pub fn n_rows(&self) -> usize {
        self.y.len()
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.x[i * self.n_params..(i + 1) * self.n_params]
    }

    /// Linear predictor `Xβ`.
    pub fn linear_predictor(&self, beta: &[f64]) -> Vec<f64> {
        (0..self.n_rows())
            .map(|i| self.row(i).iter().zip(beta).map(|(x, b)| x * b).sum())
            .collect()
    }

    /// Build the model matrix, validating inputs and applying `policy`.
    pub fn build(
        design: &DesignMatrix,
        responses: &[f64],
        policy: ZeroFeaturePolicy,
    ) -> Result<Self, EstimationError> {
        if design.n_rows() != responses.len() {
            return Err(EstimationError::DimensionMismatch {
                rows: design.n_rows(),
                responses: responses.len(),
            });
        }

        let n_params = design.n_cols() + 1;
        let mut x = Vec::with_capacity(design.n_rows() * n_params);
        let mut y = Vec::with_capacity(design.n_rows());
        let mut rows_excluded = 0;
        let mut rows_floored = 0;

        for (i, (row, &count)) in design.rows().zip(responses).enumerate() {
            if !count.is_finite() || count < 0.0 {
                return Err(EstimationError::InvalidResponse { row: i, value: count });
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(EstimationError::InvalidFeature {
                    row: i,
                    column: design.columns()[j].clone(),
                    value: row[j],
                });
            }

            let has_zero = row.iter().any(|&v| v <= 0.0);
            match (has_zero, policy) {
                (false, _) => {
                    x.push(1.0);
                    x.extend(row.iter().map(|v| v.ln()));
                }
                (true, ZeroFeaturePolicy::Floor(floor)) => {
                    rows_floored += 1;
                    x.push(1.0);
                    x.extend(row.iter().map(|&v| if v <= 0.0 { floor.ln() } else { v.ln() }));
                }
                (true, ZeroFeaturePolicy::ExcludeRow) => {
                    rows_excluded += 1;
                    continue;
                }
            }
            y.push(count);
        }

        if y.len() < n_params {
            return Err(EstimationError::InsufficientData {
                required: n_params,
                provided: y.len(),
            });
        }

        Ok(Self {
            x,
            y,
            n_params,
            rows_excluded,
            rows_floored,
        })
    }
}

/// Term names for a design: `intercept`, then `ln_<column>`.
pub(crate) fn term_names(design: &DesignMatrix) -> Vec<String> {
    std::iter::once("intercept".to_string())
        .chain(design.columns().iter().map(|c| format!("ln_{}", c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design(rows: &[Vec<f64>]) -> DesignMatrix {
        DesignMatrix::from_rows(vec!["pre".into(), "post".into()], rows).unwrap()
    }

    #[test]
    fn test_floor_keeps_rows() {
        let d = design(&[vec![1.0, 0.0], vec![2.0, 3.0], vec![4.0, 5.0]]);
        let log = LogDesign::build(&d, &[0.0, 1.0, 2.0], ZeroFeaturePolicy::Floor(1e-12)).unwrap();
        assert_eq!(log.n_rows(), 3);
        assert_eq!(log.rows_floored, 1);
        assert_eq!(log.row(0), &[1.0, 0.0, 1e-12_f64.ln()]);
    }

    #[test]
    fn test_exclude_drops_rows() {
        let d = design(&[vec![1.0, 0.0], vec![2.0, 3.0], vec![4.0, 5.0], vec![3.0, 1.0]]);
        let log =
            LogDesign::build(&d, &[0.0, 1.0, 2.0, 1.0], ZeroFeaturePolicy::ExcludeRow).unwrap();
        assert_eq!(log.n_rows(), 3);
        assert_eq!(log.rows_excluded, 1);
        assert_eq!(log.y, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_too_few_rows_after_exclusion() {
        let d = design(&[vec![0.0, 1.0], vec![2.0, 3.0]]);
        let err = LogDesign::build(&d, &[1.0, 1.0], ZeroFeaturePolicy::ExcludeRow).unwrap_err();
        assert_eq!(err, EstimationError::InsufficientData { required: 3, provided: 1 });
    }

    #[test]
    fn test_length_mismatch() {
        let d = design(&[vec![1.0, 1.0]]);
        let err = LogDesign::build(&d, &[1.0, 2.0], ZeroFeaturePolicy::default()).unwrap_err();
        assert!(matches!(err, EstimationError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_terms() {
        let d = design(&[vec![1.0, 1.0]]);
        assert_eq!(term_names(&d), vec!["intercept", "ln_pre", "ln_post"]);
    }
}
