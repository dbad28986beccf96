//! Weighted Moments

use crate::error::SpectralError;

/// Weighted mean and variance of a signal
#[derive(Debug, Clone, Default)]
pub struct WeightedMoments {
    /// Weighted mean
    pub mean: f64,
    /// Weighted variance (weights sum to 1)
    pub variance: f64,
}

impl WeightedMoments {
    /// Compute moments; `weights` must already sum to 1
    pub fn compute(values: &[f64], weights: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mean = values.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>();
        let variance = values
            .iter()
            .zip(weights)
            .map(|(v, w)| {
                let d = v - mean;
                w * d * d
            })
            .sum::<f64>();

        Self { mean, variance }
    }
}

/// Normalized weights: uniform, or proportional to 1/σ² when uncertainties are given
pub fn normalized_weights(n: usize, errors: Option<&[f64]>) -> Result<Vec<f64>, SpectralError> {
    let raw: Vec<f64> = match errors {
        Some(errors) => {
            if errors.iter().any(|e| !e.is_finite() || *e <= 0.0) {
                return Err(SpectralError::NonFiniteInput("uncertainty"));
            }
            errors.iter().map(|e| 1.0 / (e * e)).collect()
        }
        None => vec![1.0; n],
    };

    let total: f64 = raw.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(SpectralError::NonFiniteInput("uncertainty"));
    }
    Ok(raw.into_iter().map(|w| w / total).collect())
}
