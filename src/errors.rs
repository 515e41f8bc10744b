//! Error types for building puzzles and loading their inputs.
//!
//! Failing to find a fill is not an error: see [`crate::FillFailure`]. Everything here describes
//! input that could not be turned into a puzzle in the first place.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("Malformed grid: row {row} has {found} cells, expected {expected}")]
    MalformedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid cell '{cell}' at row {row}, column {column} (expected '_', '.', or '#')")]
    InvalidCell { row: usize, column: usize, cell: char },

    #[error("Failed to read \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FillError {
    /// Returns the error code for this error variant
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            FillError::MalformedGrid { .. } => "E001",
            FillError::InvalidCell { .. } => "E002",
            FillError::Io { .. } => "E003",
        }
    }
}
