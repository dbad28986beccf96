//! Time Series Representation

use crate::error::LoadError;
use serde::{Deserialize, Serialize};

/// One brightness measurement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Modified Julian Date
    pub time: f64,
    /// Magnitude
    pub magnitude: f64,
    /// Magnitude uncertainty, when the source provides one
    pub error: Option<f64>,
}

/// Light curve of a single object, keyed by its source file name.
///
/// Times and magnitudes are parallel arrays of equal, non-zero length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    identifier: String,
    times: Vec<f64>,
    magnitudes: Vec<f64>,
    errors: Option<Vec<f64>>,
}

impl TimeSeries {
    /// Create an unweighted series
    pub fn new(
        identifier: impl Into<String>,
        times: Vec<f64>,
        magnitudes: Vec<f64>,
    ) -> Result<Self, LoadError> {
        if times.len() != magnitudes.len() {
            return Err(LoadError::LengthMismatch {
                times: times.len(),
                magnitudes: magnitudes.len(),
            });
        }
        if times.is_empty() {
            return Err(LoadError::Empty);
        }
        Ok(Self {
            identifier: identifier.into(),
            times,
            magnitudes,
            errors: None,
        })
    }

    /// Attach per-observation uncertainties
    pub fn with_errors(mut self, errors: Vec<f64>) -> Result<Self, LoadError> {
        if errors.len() != self.times.len() {
            return Err(LoadError::LengthMismatch {
                times: self.times.len(),
                magnitudes: errors.len(),
            });
        }
        self.errors = Some(errors);
        Ok(self)
    }

    /// Build a series from row-oriented observations.
    ///
    /// Uncertainties are kept only if every observation carries one.
    pub fn from_observations(
        identifier: impl Into<String>,
        observations: &[Observation],
    ) -> Result<Self, LoadError> {
        let times = observations.iter().map(|o| o.time).collect();
        let magnitudes = observations.iter().map(|o| o.magnitude).collect();
        let series = Self::new(identifier, times, magnitudes)?;

        let errors: Option<Vec<f64>> = observations.iter().map(|o| o.error).collect();
        match errors {
            Some(errors) => series.with_errors(errors),
            None => Ok(series),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn errors(&self) -> Option<&[f64]> {
        self.errors.as_deref()
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false for a constructed series; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Time baseline (max - min)
    pub fn baseline(&self) -> f64 {
        let min = self.times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = self.times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        max - min
    }
}
