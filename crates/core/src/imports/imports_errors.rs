use thiserror::Error;

/// Errors that abort an import before any row is written.
///
/// Row-level problems (unparseable date, unknown symbol, missing amount)
/// never surface here; the pipelines skip and count those.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    #[error("Missing required sheet: {0}")]
    MissingSheet(String),

    #[error("Failed to read statement: {0}")]
    Statement(String),

    #[error("Invalid adjustments file: {0}")]
    Adjustments(String),
}
