//! Penalized least squares solver.
//!
//! Fitting the forecasting model reduces to a ridge-regularized regression:
//!
//! ```text
//! minimize Σ (y_i - x_i^T θ)^2 + Σ_j (λ_j θ_j)^2
//! ```
//!
//! The penalty is folded into the design by appending one row per parameter
//! (`λ_j` on the diagonal, target 0), and the augmented system is solved by SVD.
//! A zero `λ_j` leaves that parameter unpenalized.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the ridge-penalized problem with per-parameter penalty weights.
///
/// # Panics
/// Panics if `penalties.len() != x.ncols()` or `y.len() != x.nrows()`.
pub fn solve_penalized(x: &DMatrix<f64>, y: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    let (n, p) = x.shape();
    assert_eq!(penalties.len(), p, "one penalty per column");
    assert_eq!(y.len(), n, "one target per row");

    let mut xa = DMatrix::<f64>::zeros(n + p, p);
    xa.view_mut((0, 0), (n, p)).copy_from(x);
    let mut ya = DVector::<f64>::zeros(n + p);
    ya.rows_mut(0, n).copy_from(y);
    for (j, &lambda) in penalties.iter().enumerate() {
        xa[(n + j, j)] = lambda.max(0.0);
    }

    solve_least_squares(&xa, &ya)
}
