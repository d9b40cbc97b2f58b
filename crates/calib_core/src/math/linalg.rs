//! Dense Cholesky factorisation for symmetric positive-definite systems.
//!
//! Matrices are `Vec<Vec<f64>>` in row-major order. All routines return
//! `None` instead of panicking when the input is not positive definite or
//! has inconsistent dimensions.

/// Pivot magnitude below which a factor is treated as singular.
const PIVOT_EPS: f64 = 1e-300;

/// Factorise `A = L Lᵀ` and return the lower-triangular `L`.
pub fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    if n == 0 || a.iter().any(|row| row.len() != n) {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                if l[j][j].abs() < PIVOT_EPS {
                    return None;
                }
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve `L Lᵀ x = b` for a precomputed Cholesky factor.
pub fn solve_with_factor(l: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || l.len() != n {
        return None;
    }

    // Forward substitution: L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        if l[i][i].abs() < PIVOT_EPS {
            return None;
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: Lᵀ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        if l[i][i].abs() < PIVOT_EPS {
            return None;
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

/// Solve `A x = b` for symmetric positive-definite `A`.
pub fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    if a.len() != b.len() {
        return None;
    }
    let l = cholesky(a)?;
    solve_with_factor(&l, b)
}

/// Invert a symmetric positive-definite matrix.
pub fn invert_spd(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let l = cholesky(a)?;
    let mut inv = vec![vec![0.0; n]; n];
    let mut e = vec![0.0; n];
    for j in 0..n {
        e.iter_mut().for_each(|v| *v = 0.0);
        e[j] = 1.0;
        let col = solve_with_factor(&l, &e)?;
        for i in 0..n {
            inv[i][j] = col[i];
        }
    }
    Some(inv)
}
