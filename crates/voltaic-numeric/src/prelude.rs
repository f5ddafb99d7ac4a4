pub use crate::error::Error;
pub type Result<T> = core::result::Result<T, Error>;

pub use crate::matrix::DenseMatrix;
pub use crate::solve::{cascading_solve, Method, SolveOutcome};
