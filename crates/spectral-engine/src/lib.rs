//! Spectral Feature Engine
//!
//! Lomb-Scargle periodograms over unevenly sampled light curves and the
//! top-K power features derived from them.

mod error;
mod extractor;
mod grid;
mod periodogram;
mod statistics;

pub use error::SpectralError;
pub use extractor::{
    round_to, top_k_descending, ExtractorConfig, FeatureVector, SpectralFeatureExtractor,
    DEFAULT_DECIMALS, DEFAULT_MIN_OBSERVATIONS, DEFAULT_TOP_K,
};
pub use grid::{FrequencyGrid, GridConfig};
pub use periodogram::{LombScargle, Periodogram, PeriodogramMethod, AUTO_FAST_THRESHOLD};
pub use statistics::WeightedMoments;
