use thiserror::Error;

use crate::transient::TransientResult;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Preprocess(#[from] voltaic_core::error::Error),

    #[error(transparent)]
    Numeric(#[from] voltaic_numeric::error::Error),

    #[error("event localization did not converge within {iterations} bisections at step {step}")]
    EventLocalizationFailed { step: usize, iterations: usize },

    #[error("solution diverged at step {step} (t = {time}): component exceeds finite range")]
    NumericalBlowup { step: usize, time: f64 },

    #[error("{0} is not yet implemented")]
    Unsupported(&'static str),
}

/// A transient run that failed partway through: the triggering error plus
/// every `(t, v, x)` recorded before the failure, per §7's "terminate the
/// run, return the partial trajectory collected so far" recovery policy.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PartialTransientResult {
    pub error: Error,
    pub trajectory: TransientResult,
}

impl PartialTransientResult {
    pub(crate) fn empty(error: Error) -> Self {
        PartialTransientResult {
            error,
            trajectory: TransientResult {
                times: Vec::new(),
                node_voltages: std::collections::HashMap::new(),
                state_variables: std::collections::HashMap::new(),
            },
        }
    }
}
