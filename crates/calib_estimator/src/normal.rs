//! Weighted normal equations `XᵀWX β = XᵀWz`.

use crate::transform::LogDesign;

/// Tables at least this long are accumulated in parallel.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_ROWS: usize = 4096;

/// Accumulated `XᵀWX` (dense, symmetric) and `XᵀWz`.
#[derive(Debug, Clone)]
pub(crate) struct NormalEquations {
    pub xtwx: Vec<Vec<f64>>,
    pub xtwz: Vec<f64>,
}

impl NormalEquations {
    fn zeros(k: usize) -> Self {
        Self {
            xtwx: vec![vec![0.0; k]; k],
            xtwz: vec![0.0; k],
        }
    }

    fn add_row(&mut self, x: &[f64], w: f64, z: f64) {
        for (a, &xa) in x.iter().enumerate() {
            let wxa = w * xa;
            self.xtwz[a] += wxa * z;
            for (b, &xb) in x.iter().enumerate().take(a + 1) {
                self.xtwx[a][b] += wxa * xb;
            }
        }
    }

    fn merge(mut self, other: Self) -> Self {
        for (row, other_row) in self.xtwx.iter_mut().zip(other.xtwx) {
            for (v, o) in row.iter_mut().zip(other_row) {
                *v += o;
            }
        }
        for (v, o) in self.xtwz.iter_mut().zip(other.xtwz) {
            *v += o;
        }
        self
    }

    fn symmetrise(mut self) -> Self {
        let k = self.xtwz.len();
        for a in 0..k {
            for b in (a + 1)..k {
                self.xtwx[a][b] = self.xtwx[b][a];
            }
        }
        self
    }
}

/// Accumulate the normal equations for weights `w` and working response `z`.
pub(crate) fn accumulate(design: &LogDesign, w: &[f64], z: &[f64]) -> NormalEquations {
    #[cfg(feature = "parallel")]
    {
        if design.n_rows() >= PARALLEL_MIN_ROWS {
            return accumulate_parallel(design, w, z);
        }
    }

    let mut acc = NormalEquations::zeros(design.n_params);
    for i in 0..design.n_rows() {
        acc.add_row(design.row(i), w[i], z[i]);
    }
    acc.symmetrise()
}

#[cfg(feature = "parallel")]
fn accumulate_parallel(design: &LogDesign, w: &[f64], z: &[f64]) -> NormalEquations {
    use rayon::prelude::*;

    let k = design.n_params;
    (0..design.n_rows())
        .into_par_iter()
        .fold(
            || NormalEquations::zeros(k),
            |mut acc, i| {
                acc.add_row(design.row(i), w[i], z[i]);
                acc
            },
        )
        .reduce(|| NormalEquations::zeros(k), NormalEquations::merge)
        .symmetrise()
}
