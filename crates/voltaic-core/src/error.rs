use thiserror::Error;

/// Errors surfaced by the circuit preprocessor.
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate component name(s): {0:?}")]
    DuplicateComponentNames(Vec<String>),

    #[error("component(s) reference an empty or malformed node name: {0:?}")]
    InvalidNodeReference(Vec<String>),

    #[error(transparent)]
    Device(#[from] voltaic_devices::error::Error),
}
