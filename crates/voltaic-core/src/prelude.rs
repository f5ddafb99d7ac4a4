pub use crate::error::Error;
pub type Result<T> = core::result::Result<T, Error>;

pub use crate::circuit::Circuit;
pub use crate::config::SolverConfig;
pub use crate::preprocess::{Plan, StateVariable};
