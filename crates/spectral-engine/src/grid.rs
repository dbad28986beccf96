//! Frequency Grid Selection

use crate::error::SpectralError;
use serde::{Deserialize, Serialize};

/// Parameters of the automatic frequency grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid points across each periodogram peak
    pub samples_per_peak: f64,
    /// Upper bound as a multiple of the average Nyquist frequency
    pub nyquist_factor: f64,
    /// Lower bound override (cycles per day)
    pub minimum_frequency: Option<f64>,
    /// Upper bound override (cycles per day)
    pub maximum_frequency: Option<f64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            samples_per_peak: 5.0,
            nyquist_factor: 5.0,
            minimum_frequency: None,
            maximum_frequency: None,
        }
    }
}

impl GridConfig {
    /// Check parameters independently of any data
    pub fn validate(&self) -> Result<(), SpectralError> {
        if !(self.samples_per_peak.is_finite() && self.samples_per_peak > 0.0) {
            return Err(SpectralError::InvalidGrid(format!(
                "samples_per_peak must be positive, got {}",
                self.samples_per_peak
            )));
        }
        if !(self.nyquist_factor.is_finite() && self.nyquist_factor > 0.0) {
            return Err(SpectralError::InvalidGrid(format!(
                "nyquist_factor must be positive, got {}",
                self.nyquist_factor
            )));
        }
        if let (Some(lo), Some(hi)) = (self.minimum_frequency, self.maximum_frequency) {
            if lo > hi {
                return Err(SpectralError::InvalidGrid(format!(
                    "minimum_frequency {} exceeds maximum_frequency {}",
                    lo, hi
                )));
            }
        }
        Ok(())
    }
}

/// Regular grid `start + k * step` for `k in 0..len`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyGrid {
    start: f64,
    step: f64,
    len: usize,
}

impl FrequencyGrid {
    pub fn new(start: f64, step: f64, len: usize) -> Result<Self, SpectralError> {
        if !(start.is_finite() && start >= 0.0) {
            return Err(SpectralError::InvalidGrid(format!("bad start frequency {}", start)));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(SpectralError::InvalidGrid(format!("bad frequency step {}", step)));
        }
        Ok(Self { start, step, len })
    }

    /// Choose a grid from the sampling pattern.
    ///
    /// The step resolves a peak of width `1 / baseline` with
    /// `samples_per_peak` points; the upper bound is `nyquist_factor`
    /// times the average Nyquist frequency `n / (2 * baseline)`.
    pub fn auto(times: &[f64], config: &GridConfig) -> Result<Self, SpectralError> {
        config.validate()?;

        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let baseline = max - min;
        if !(baseline.is_finite() && baseline > 0.0) {
            return Err(SpectralError::DegenerateSampling);
        }

        let step = 1.0 / baseline / config.samples_per_peak;
        let start = config.minimum_frequency.unwrap_or(0.5 * step);
        let stop = config
            .maximum_frequency
            .unwrap_or(config.nyquist_factor * 0.5 * times.len() as f64 / baseline);
        if stop < start {
            return Err(SpectralError::InvalidGrid(format!(
                "maximum frequency {} below minimum {}",
                stop, start
            )));
        }

        let len = 1 + ((stop - start) / step).round_ties_even() as usize;
        Self::new(start, step, len)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frequency at index `k`
    pub fn frequency(&self, k: usize) -> f64 {
        self.start + self.step * k as f64
    }

    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len).map(move |k| self.frequency(k))
    }
}
