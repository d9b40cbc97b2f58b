//! Numerical building blocks for the observation-model fit.
//!
//! ## Available Routines
//!
//! - [`cholesky`], [`solve_cholesky`], [`invert_spd`]: dense symmetric
//!   positive-definite systems (normal equations of weighted least squares)
//! - [`ln_gamma`], [`ln_factorial`]: log-gamma for Poisson log-likelihoods
//!
//! ## Example
//!
//! ```
//! use calib_core::math::solve_cholesky;
//!
//! // 4*x0 + 2*x1 = 8, 2*x0 + 2*x1 = 5
//! let a = vec![vec![4.0, 2.0], vec![2.0, 2.0]];
//! let x = solve_cholesky(&a, &[8.0, 5.0]).unwrap();
//! assert!((x[0] - 1.5).abs() < 1e-12);
//! assert!((x[1] - 1.0).abs() < 1e-12);
//! ```

mod linalg;
mod special;

pub use linalg::{cholesky, invert_spd, solve_cholesky, solve_with_factor};
pub use special::{ln_factorial, ln_gamma};
