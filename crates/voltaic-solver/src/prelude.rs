pub use crate::error::{Error, PartialTransientResult};
pub type Result<T> = core::result::Result<T, Error>;

pub use voltaic_core::config::SolverConfig;

pub use crate::dc::{solve_dc, DcResult};
pub use crate::integration::IntegrationMethod;
pub use crate::transient::{run_transient, ControlFn, StepOutput, TransientParams, TransientResult, TransientStepper};
