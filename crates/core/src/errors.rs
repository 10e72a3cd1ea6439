use thiserror::Error;

use crate::imports::ImportError;

/// Result type alias for operations that can fail with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the crate.
///
/// Storage and market-data failures arrive through the port traits as plain
/// strings so the core stays agnostic of the concrete backend.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Market data provider error: {0}")]
    Provider(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Input validation errors for models crossing the crate boundary.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Failed to parse decimal value: {0}")]
    DecimalParse(String),

    #[error("Failed to parse date/time value: {0}")]
    DateTimeParse(String),

    #[error("Invalid currency code: {0}")]
    InvalidCurrencyCode(String),
}

impl From<chrono::ParseError> for Error {
    fn from(err: chrono::ParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err.to_string()))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err.to_string()))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
