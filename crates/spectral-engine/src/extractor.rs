//! Spectral Feature Extraction

use crate::error::SpectralError;
use crate::grid::{FrequencyGrid, GridConfig};
use crate::periodogram::{LombScargle, Periodogram, PeriodogramMethod};
use light_curve::TimeSeries;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use tracing::debug;

/// Default number of strongest powers kept per series
pub const DEFAULT_TOP_K: usize = 4;

/// Default minimum number of observations
pub const DEFAULT_MIN_OBSERVATIONS: usize = 15;

/// Default rounding precision (decimal places)
pub const DEFAULT_DECIMALS: u32 = 2;

/// Extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Number of powers kept (K)
    pub top_k: usize,
    /// Series shorter than this are excluded
    pub min_observations: usize,
    /// Decimal places kept after rounding
    pub decimals: u32,
    /// Periodogram evaluation strategy
    pub method: PeriodogramMethod,
    /// Frequency grid selection
    pub grid: GridConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
            decimals: DEFAULT_DECIMALS,
            method: PeriodogramMethod::default(),
            grid: GridConfig::default(),
        }
    }
}

/// Top-K rounded periodogram powers of one series, strongest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Source file name
    pub identifier: String,
    /// Exactly K rounded values in descending order
    pub powers: Vec<f64>,
}

impl FeatureVector {
    pub fn new(identifier: impl Into<String>, powers: Vec<f64>) -> Self {
        Self {
            identifier: identifier.into(),
            powers,
        }
    }
}

/// Computes [`FeatureVector`]s from time series
#[derive(Debug, Clone, Default)]
pub struct SpectralFeatureExtractor {
    config: ExtractorConfig,
}

impl SpectralFeatureExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Full periodogram of a series
    pub fn periodogram(
        &self,
        series: &TimeSeries,
        cancel: &AtomicBool,
    ) -> Result<Periodogram, SpectralError> {
        let grid = FrequencyGrid::auto(series.times(), &self.config.grid)?;
        let ls = LombScargle::new(series.times(), series.magnitudes(), series.errors())?;
        let power = ls.power(&grid, self.config.method, cancel)?;
        Ok(Periodogram { grid, power })
    }

    /// Extract features, running to completion
    pub fn extract(&self, series: &TimeSeries) -> Result<FeatureVector, SpectralError> {
        self.extract_cancellable(series, &AtomicBool::new(false))
    }

    /// Extract features, abandoning work once `cancel` is set
    pub fn extract_cancellable(
        &self,
        series: &TimeSeries,
        cancel: &AtomicBool,
    ) -> Result<FeatureVector, SpectralError> {
        if series.len() < self.config.min_observations {
            return Err(SpectralError::InsufficientData {
                needed: self.config.min_observations,
                got: series.len(),
            });
        }

        let periodogram = self.periodogram(series, cancel)?;
        if let Some((frequency, power)) = periodogram.peak() {
            debug!(
                "{}: {} observations over {:.1}d, {} frequencies, peak {:.4} at {:.5}/d",
                series.identifier(),
                series.len(),
                series.baseline(),
                periodogram.power.len(),
                power,
                frequency
            );
        }

        let top = top_k_descending(&periodogram.power, self.config.top_k)?;
        let powers = top
            .into_iter()
            .map(|p| round_to(p, self.config.decimals))
            .collect();

        Ok(FeatureVector::new(series.identifier(), powers))
    }
}

/// The `k` largest values, largest first. Errors if fewer than `k` exist.
pub fn top_k_descending(values: &[f64], k: usize) -> Result<Vec<f64>, SpectralError> {
    if values.len() < k {
        return Err(SpectralError::ShortSpectrum {
            needed: k,
            got: values.len(),
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted.truncate(k);
    Ok(sorted)
}

/// Round to `decimals` places, ties to even; never returns `-0.0`
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale + 0.0
}
