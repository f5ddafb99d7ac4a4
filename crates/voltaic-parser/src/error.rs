use thiserror::Error;

/// Errors surfaced while turning netlist text into circuit components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("invalid numeric value '{0}'")]
    InvalidValue(String),

    #[error("unrecognized line: '{0}'")]
    UnrecognizedLine(String),

    #[error("model '{0}' referenced but never defined")]
    UndefinedModel(String),

    #[error("netlist contains no components")]
    EmptyNetlist,

    #[error("{0}: not implemented by this parser")]
    Unsupported(String),

    #[error(transparent)]
    Device(#[from] voltaic_devices::error::Error),

    #[error("failed to read netlist file: {0}")]
    Io(#[from] std::io::Error),
}
