//! Loader Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors while discovering or reading light curves
#[derive(Debug, Error)]
pub enum LoadError {
    /// Base directory missing or unreadable. Fatal for the whole run.
    #[error("cannot read input directory {path}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    /// I/O failure on a single file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File has no usable observations
    #[error("no usable observations")]
    Empty,

    /// Required column not present in the header
    #[error("missing required column `{0}`")]
    MissingColumn(String),

    /// Parallel arrays of different lengths
    #[error("length mismatch: {times} times, {magnitudes} magnitudes")]
    LengthMismatch { times: usize, magnitudes: usize },

    /// Identifier not known to the source
    #[error("unknown series `{0}`")]
    UnknownSeries(String),
}

impl LoadError {
    /// Whether this error aborts the run rather than a single file
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoadError::Discovery { .. })
    }
}

/// Reason a single CSV row was dropped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowRejection {
    /// Empty cell
    #[error("{0} is missing")]
    Missing(&'static str),

    /// Cell is not a number
    #[error("{field} value `{raw}` is not a number")]
    Unparseable { field: &'static str, raw: String },

    /// NaN or infinite
    #[error("{field} value {value} is not finite")]
    NonFinite { field: &'static str, value: f64 },

    /// Uncertainty must be strictly positive to weight the fit
    #[error("error value {0} is not positive")]
    NonPositiveError(f64),
}
