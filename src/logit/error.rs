use thiserror::Error;

/// Errors from design matrix construction and model fitting.
#[derive(Debug, Error)]
pub enum LogitError {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("response must be 0/1, found {0}")]
    InvalidResponse(f64),

    #[error(
        "weighted least squares system is singular; predictors may be collinear or separated"
    )]
    SingularSystem,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

pub type Result<T> = std::result::Result<T, LogitError>;
