//! Error types for the claims data warehouse

use thiserror::Error;

/// Result type alias for staging operations
pub type Result<T> = std::result::Result<T, StageError>;

/// Main error type for the staging loader
#[derive(Error, Debug)]
pub enum StageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("header mismatch in {file}: expected [{expected}], found [{actual}]")]
    HeaderMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}
