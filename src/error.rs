use std::fmt;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodebookError>;

#[derive(thiserror::Error, Debug)]
pub enum CodebookError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "audio")]
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Malformed codebook record: {0}")]
    Format(String),
    #[error(
        "{what} range out of bounds: offset {offset} + length {requested} exceeds {available}"
    )]
    RangeViolation {
        what: RangeTarget,
        offset: usize,
        requested: usize,
        available: usize,
    },
    #[error("Failed to build parameters: {0}")]
    Builder(String),
}

/// Which part of a component a strict extraction was filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeTarget {
    Mean,
    CovarianceRows,
    CovarianceColumns,
}

impl fmt::Display for RangeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "Mean"),
            Self::CovarianceRows => write!(f, "Covariance row"),
            Self::CovarianceColumns => write!(f, "Covariance column"),
        }
    }
}

impl From<derive_builder::UninitializedFieldError> for CodebookError {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        Self::Builder(e.to_string())
    }
}
