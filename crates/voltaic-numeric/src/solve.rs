use log::{debug, trace, warn};

use crate::error::Error;
use crate::matrix::DenseMatrix;
use crate::prelude::Result;

/// Tunables for the iterative/direct solver cascade.
///
/// Defaults match the numeric tolerances the transient and DC solvers are
/// built against; callers needing different behavior (e.g. a stiffer circuit
/// that never converges under Jacobi) can override any field.
#[derive(Debug, Clone, Copy)]
pub struct LinearSolverConfig {
    /// Iteration cap shared by Jacobi and Gauss-Seidel.
    pub max_iterations: usize,
    /// `||Ax - b||_2` threshold for iterative convergence.
    pub residual_tolerance: f64,
    /// Pivot magnitude below which the direct solver reports `SingularMatrix`.
    pub singular_pivot_tolerance: f64,
    /// Diagonal magnitude below which an iterative method refuses to start.
    pub zero_diagonal_tolerance: f64,
    /// Added to any diagonal entry smaller than `zero_diagonal_tolerance` before
    /// iterating, so a merely-small (not exactly singular) diagonal can still
    /// be attempted iteratively.
    pub diagonal_regularization: f64,
    pub sor_initial_omega: f64,
    pub sor_max_omega: f64,
    pub sor_backoff: f64,
}

impl Default for LinearSolverConfig {
    fn default() -> Self {
        LinearSolverConfig {
            max_iterations: 1000,
            residual_tolerance: 1e-9,
            singular_pivot_tolerance: 1e-15,
            zero_diagonal_tolerance: 1e-15,
            diagonal_regularization: 1e-10,
            sor_initial_omega: 1.0,
            sor_max_omega: 1.5,
            sor_backoff: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Jacobi,
    GaussSeidel,
    Lu,
}

#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub x: Vec<f64>,
    pub method: Method,
    pub iterations: usize,
}

fn regularized_diagonal(matrix: &DenseMatrix, i: usize, config: &LinearSolverConfig) -> f64 {
    let d = matrix.diagonal(i);
    if d.abs() < config.zero_diagonal_tolerance {
        d + config.diagonal_regularization
    } else {
        d
    }
}

/// Direct solve via Gaussian elimination with partial pivoting.
///
/// Used for the steady-state DC solve and as the final fallback of the
/// transient cascade. Operates on a scratch copy of `matrix` augmented with
/// `b`; fails with `SingularMatrix` if, after pivoting, a pivot's magnitude
/// is still below `singular_pivot_tolerance`.
pub fn lu_solve(matrix: &DenseMatrix, b: &[f64], config: &LinearSolverConfig) -> Result<Vec<f64>> {
    let n = matrix.size();
    if b.len() != n {
        return Err(Error::DimensionMismatch {
            rows: n,
            cols: n,
            len: b.len(),
        });
    }

    // Augmented matrix, row-major, n rows by n+1 columns (last column is b).
    let mut aug = vec![0.0; n * (n + 1)];
    for row in 0..n {
        for col in 0..n {
            aug[row * (n + 1) + col] = matrix.get(row, col);
        }
        aug[row * (n + 1) + n] = b[row];
    }

    for k in 0..n {
        // Partial pivoting: find the largest-magnitude entry in column k at or below row k.
        let mut pivot_row = k;
        let mut pivot_value = aug[k * (n + 1) + k].abs();
        for row in (k + 1)..n {
            let candidate = aug[row * (n + 1) + k].abs();
            if candidate > pivot_value {
                pivot_value = candidate;
                pivot_row = row;
            }
        }

        if pivot_value < config.singular_pivot_tolerance {
            warn!("lu_solve: pivot |{pivot_value}| at row {k} below singular tolerance");
            return Err(Error::SingularMatrix {
                row: k,
                value: pivot_value,
            });
        }

        if pivot_row != k {
            for col in 0..(n + 1) {
                aug.swap(k * (n + 1) + col, pivot_row * (n + 1) + col);
            }
        }

        for row in (k + 1)..n {
            let factor = aug[row * (n + 1) + k] / aug[k * (n + 1) + k];
            if factor == 0.0 {
                continue;
            }
            for col in k..(n + 1) {
                aug[row * (n + 1) + col] -= factor * aug[k * (n + 1) + col];
            }
        }
    }

    // Back substitution.
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = aug[row * (n + 1) + n];
        for col in (row + 1)..n {
            sum -= aug[row * (n + 1) + col] * x[col];
        }
        x[row] = sum / aug[row * (n + 1) + row];
    }

    trace!("lu_solve: solved {n}x{n} system");
    Ok(x)
}

/// Iterative Jacobi solve, the transient fast path's first choice.
pub fn jacobi_solve(
    matrix: &DenseMatrix,
    b: &[f64],
    initial_guess: &[f64],
    config: &LinearSolverConfig,
) -> Result<SolveOutcome> {
    let n = matrix.size();
    if b.len() != n || initial_guess.len() != n {
        return Err(Error::DimensionMismatch {
            rows: n,
            cols: n,
            len: b.len(),
        });
    }

    for i in 0..n {
        let d = regularized_diagonal(matrix, i, config);
        if d.abs() < config.zero_diagonal_tolerance {
            return Err(Error::DidNotConverge {
                method: "jacobi",
                iterations: 0,
                residual: f64::INFINITY,
            });
        }
    }

    let mut x = initial_guess.to_vec();
    let mut residual = matrix.residual_norm(&x, b);

    for iteration in 0..config.max_iterations {
        if residual < config.residual_tolerance {
            debug!("jacobi converged after {iteration} iterations, residual {residual:.3e}");
            return Ok(SolveOutcome {
                x,
                method: Method::Jacobi,
                iterations: iteration,
            });
        }

        let mut next = vec![0.0; n];
        for row in 0..n {
            let mut sum = b[row];
            for col in 0..n {
                if col != row {
                    sum -= matrix.get(row, col) * x[col];
                }
            }
            next[row] = sum / regularized_diagonal(matrix, row, config);
        }
        x = next;
        residual = matrix.residual_norm(&x, b);
    }

    warn!("jacobi did not converge after {} iterations", config.max_iterations);
    Err(Error::DidNotConverge {
        method: "jacobi",
        iterations: config.max_iterations,
        residual,
    })
}

/// Iterative Gauss-Seidel with adaptive successive over-relaxation, the
/// fallback when Jacobi diverges. The relaxation factor backs off by
/// `sor_backoff` whenever a sweep makes the residual worse, and is capped at
/// `sor_max_omega`.
pub fn gauss_seidel_solve(
    matrix: &DenseMatrix,
    b: &[f64],
    initial_guess: &[f64],
    config: &LinearSolverConfig,
) -> Result<SolveOutcome> {
    let n = matrix.size();
    if b.len() != n || initial_guess.len() != n {
        return Err(Error::DimensionMismatch {
            rows: n,
            cols: n,
            len: b.len(),
        });
    }

    for i in 0..n {
        let d = regularized_diagonal(matrix, i, config);
        if d.abs() < config.zero_diagonal_tolerance {
            return Err(Error::DidNotConverge {
                method: "gauss_seidel",
                iterations: 0,
                residual: f64::INFINITY,
            });
        }
    }

    let mut x = initial_guess.to_vec();
    let mut omega = config.sor_initial_omega;
    let mut residual = matrix.residual_norm(&x, b);

    for iteration in 0..config.max_iterations {
        if residual < config.residual_tolerance {
            debug!(
                "gauss_seidel converged after {iteration} iterations, residual {residual:.3e}, omega {omega:.3}"
            );
            return Ok(SolveOutcome {
                x,
                method: Method::GaussSeidel,
                iterations: iteration,
            });
        }

        for row in 0..n {
            let mut sum = b[row];
            for col in 0..n {
                if col != row {
                    sum -= matrix.get(row, col) * x[col];
                }
            }
            let gauss_seidel_value = sum / regularized_diagonal(matrix, row, config);
            x[row] = (1.0 - omega) * x[row] + omega * gauss_seidel_value;
        }

        let new_residual = matrix.residual_norm(&x, b);
        if new_residual > residual {
            omega = (omega * config.sor_backoff).min(config.sor_max_omega);
        }
        residual = new_residual;
    }

    warn!(
        "gauss_seidel did not converge after {} iterations",
        config.max_iterations
    );
    Err(Error::DidNotConverge {
        method: "gauss_seidel",
        iterations: config.max_iterations,
        residual,
    })
}

/// Solves `matrix * x = b` by cascading through Jacobi, then Gauss-Seidel,
/// then direct LU, surfacing the final method's error if all three fail.
pub fn cascading_solve(
    matrix: &DenseMatrix,
    b: &[f64],
    initial_guess: &[f64],
    config: &LinearSolverConfig,
) -> Result<SolveOutcome> {
    match jacobi_solve(matrix, b, initial_guess, config) {
        Ok(outcome) => return Ok(outcome),
        Err(e) => trace!("cascading_solve: jacobi failed ({e}), trying gauss-seidel"),
    }

    match gauss_seidel_solve(matrix, b, initial_guess, config) {
        Ok(outcome) => return Ok(outcome),
        Err(e) => trace!("cascading_solve: gauss-seidel failed ({e}), trying direct lu"),
    }

    let x = lu_solve(matrix, b, config)?;
    Ok(SolveOutcome {
        x,
        method: Method::Lu,
        iterations: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Triplet;

    fn diagonal_system(size: usize, diag: f64, rhs: f64) -> (DenseMatrix, Vec<f64>) {
        let triplets: Vec<Triplet> = (0..size).map(|i| Triplet::new(i, i, diag)).collect();
        (DenseMatrix::from_triplets(size, &triplets), vec![rhs; size])
    }

    #[test]
    fn lu_solves_diagonal_system() {
        let (m, b) = diagonal_system(3, 2.0, 4.0);
        let x = lu_solve(&m, &b, &LinearSolverConfig::default()).unwrap();
        for xi in x {
            assert!((xi - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn lu_reports_singular_matrix() {
        let m = DenseMatrix::zeros(2);
        let b = vec![1.0, 1.0];
        let err = lu_solve(&m, &b, &LinearSolverConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SingularMatrix { .. }));
    }

    #[test]
    fn jacobi_solves_diagonal_system() {
        let (m, b) = diagonal_system(4, 5.0, 10.0);
        let guess = vec![0.0; 4];
        let outcome = jacobi_solve(&m, &b, &guess, &LinearSolverConfig::default()).unwrap();
        for xi in outcome.x {
            assert!((xi - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn jacobi_fails_on_tridiagonal_strongly_coupled_system() {
        // A matrix where off-diagonal coupling dominates the diagonal: Jacobi diverges,
        // but the cascade should still return a solution through Gauss-Seidel or LU.
        let triplets = vec![
            Triplet::new(0, 0, 1.0),
            Triplet::new(0, 1, 2.0),
            Triplet::new(1, 0, 2.0),
            Triplet::new(1, 1, 1.0),
        ];
        let m = DenseMatrix::from_triplets(2, &triplets);
        let b = vec![3.0, 3.0];
        let outcome = cascading_solve(&m, &b, &[0.0, 0.0], &LinearSolverConfig::default()).unwrap();
        assert!(m.residual_norm(&outcome.x, &b) < 1e-6);
    }

    #[test]
    fn gauss_seidel_solves_diagonally_dominant_system() {
        let triplets = vec![
            Triplet::new(0, 0, 4.0),
            Triplet::new(0, 1, 1.0),
            Triplet::new(1, 0, 1.0),
            Triplet::new(1, 1, 3.0),
        ];
        let m = DenseMatrix::from_triplets(2, &triplets);
        let b = vec![5.0, 4.0];
        let outcome =
            gauss_seidel_solve(&m, &b, &[0.0, 0.0], &LinearSolverConfig::default()).unwrap();
        assert!(m.residual_norm(&outcome.x, &b) < 1e-6);
    }

    #[test]
    fn cascading_solve_falls_back_to_lu() {
        // Zero diagonal forces both iterative methods to refuse immediately.
        let triplets = vec![Triplet::new(0, 1, 1.0), Triplet::new(1, 0, 1.0)];
        let m = DenseMatrix::from_triplets(2, &triplets);
        let b = vec![2.0, 3.0];
        let outcome = cascading_solve(&m, &b, &[0.0, 0.0], &LinearSolverConfig::default()).unwrap();
        assert_eq!(outcome.method, Method::Lu);
        assert!((outcome.x[0] - 3.0).abs() < 1e-12);
        assert!((outcome.x[1] - 2.0).abs() < 1e-12);
    }
}
