//! Error types for the subject-browser core.
//!
//! Loading, filtering and coupling all report through [`BrowserError`] so the
//! UI can render a message without knowing which layer failed.

use thiserror::Error;

use crate::data::audiogram::Ear;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Broad category of a failure, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    TypeMismatch,
    MissingData,
    Validation,
}

#[derive(Error, Debug)]
pub enum BrowserError {
    /// Reading or writing a file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// File parsed but does not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Filter refers to a column the dataset does not have
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Operator operand type does not match the column type
    #[error("cannot compare column '{column}' using '{operator}': {detail}")]
    TypeMismatch {
        column: String,
        operator: String,
        detail: String,
    },

    /// A threshold needed for the coupling recommendation is absent
    #[error("{ear} ear has no air-conduction threshold at {frequency} Hz")]
    MissingData { ear: Ear, frequency: u32 },

    /// Incomplete or malformed filter input
    #[error("{0}")]
    Validation(String),
}

impl BrowserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrowserError::Io(_) | BrowserError::Csv(_) | BrowserError::Parse(_) => ErrorKind::Parse,
            BrowserError::UnknownColumn(_) | BrowserError::TypeMismatch { .. } => {
                ErrorKind::TypeMismatch
            }
            BrowserError::MissingData { .. } => ErrorKind::MissingData,
            BrowserError::Validation(_) => ErrorKind::Validation,
        }
    }
}
