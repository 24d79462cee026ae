use crate::validation::ValidationError;
use arrow::error::ArrowError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an ETL run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Failed to read source {path:?}: {reason}")]
    SourceRead { path: PathBuf, reason: String },

    #[error("Schema error in {source_name}: {reason}")]
    Schema { source_name: String, reason: String },

    #[error("Timestamp derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Failed to write table at {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("Table {table} failed validation: {error}")]
    Validation {
        table: &'static str,
        error: ValidationError,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl EtlError {
    pub fn source_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EtlError::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema(source_name: &str, reason: impl ToString) -> Self {
        EtlError::Schema {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EtlError::Write {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// A raw `ts` value that cannot be turned into a calendar timestamp.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DerivationError {
    #[error("timestamp {0} is not an integer number of milliseconds")]
    NonNumeric(String),

    #[error("timestamp {0} ms is out of the representable range")]
    OutOfRange(i64),
}

pub type EtlResult<T> = Result<T, EtlError>;
