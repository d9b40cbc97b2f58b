//! Loader errors.

use calib_core::types::DataError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing run outputs.
///
/// None of these are retried: re-running the simulator on the same inputs
/// would produce the same malformed file.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Output file not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// IO error
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV reader or writer error
    #[error("CSV error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Missing required column
    #[error("Missing required column '{column}' in {}", path.display())]
    MissingColumn { path: PathBuf, column: String },

    /// Malformed row
    #[error("Parse error in {} at line {line}: {message} (row: \"{row}\")", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        row: String,
        message: String,
    },

    /// Malformed summary statistics report
    #[error("Invalid summary statistics in {}: {message}", path.display())]
    InvalidSummary { path: PathBuf, message: String },

    /// Records violate a data-model invariant
    #[error(transparent)]
    Data(#[from] DataError),
}

impl LoaderError {
    /// Create a parse error.
    pub fn parse(
        path: impl Into<PathBuf>,
        line: u64,
        row: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LoaderError::Parse {
            path: path.into(),
            line,
            row: row.into(),
            message: message.into(),
        }
    }

    /// Create an IO error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoaderError::Io {
            path: path.into(),
            source,
        }
    }
}
