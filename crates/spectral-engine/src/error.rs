//! Spectral Error Types

use thiserror::Error;

/// Errors while computing a periodogram or its features
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpectralError {
    /// Too few observations to support a periodogram. A policy exclusion.
    #[error("{got} observations, at least {needed} required")]
    InsufficientData { needed: usize, got: usize },

    /// All timestamps equal, so no time baseline exists
    #[error("degenerate sampling: zero time baseline")]
    DegenerateSampling,

    /// Constant magnitudes leave nothing to normalize against
    #[error("magnitudes have zero variance")]
    ZeroVariance,

    /// NaN or infinite input value
    #[error("non-finite {0} value in input")]
    NonFiniteInput(&'static str),

    /// Frequency grid smaller than the requested feature count
    #[error("spectrum has {got} frequencies, {needed} required")]
    ShortSpectrum { needed: usize, got: usize },

    /// Power evaluated to NaN or infinity
    #[error("non-finite power at frequency {frequency}")]
    NonFinitePower { frequency: f64 },

    /// Grid parameters cannot produce a valid grid
    #[error("invalid frequency grid: {0}")]
    InvalidGrid(String),

    /// Computation abandoned by the caller
    #[error("computation cancelled")]
    Cancelled,
}

impl SpectralError {
    /// Whether the series was excluded by the minimum-observation policy
    /// rather than by a numerical failure
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, SpectralError::InsufficientData { .. })
    }
}
