use thiserror::Error;

/// Canonical result for core and the crates layered on it.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal pipeline failures. Anything in here aborts the run; per-record
/// evaluation problems never reach this type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("step {step} ({op}): invalid configuration: {message}")]
    Config {
        step: usize,
        op: String,
        message: String,
    },

    #[error("step {step}: unknown operator '{op}'")]
    UnknownOperator { step: usize, op: String },

    #[error("invalid pipeline document: {0}")]
    Document(String),

    #[error("invalid input collection: {0}")]
    Input(String),
}

impl Error {
    /// Step index the failure is attributed to, if any.
    pub fn step(&self) -> Option<usize> {
        match self {
            Error::Config { step, .. } | Error::UnknownOperator { step, .. } => Some(*step),
            Error::Document(_) | Error::Input(_) => None,
        }
    }

    /// Operator name the failure is attributed to, if any.
    pub fn op(&self) -> Option<&str> {
        match self {
            Error::Config { op, .. } | Error::UnknownOperator { op, .. } => Some(op),
            Error::Document(_) | Error::Input(_) => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Document(e.to_string())
    }
}
