use thiserror::Error;

/// Errors surfaced by the linear-algebra layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("matrix is singular: pivot |{value}| at row {row} fell below 1e-15")]
    SingularMatrix { row: usize, value: f64 },

    #[error("{method} did not converge after {iterations} iterations (residual {residual:.3e})")]
    DidNotConverge {
        method: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("matrix and vector dimensions do not agree: matrix is {rows}x{cols}, vector has {len} entries")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        len: usize,
    },
}
