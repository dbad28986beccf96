//! Pipeline Configuration
//!
//! Layered from lowest to highest precedence: built-in defaults, an optional
//! config file, `LCINDEX_`-prefixed environment variables (`__` separates
//! nested keys), then whatever the caller overrides explicitly.

use crate::PipelineError;
use ::config::{Config, Environment, File};
use light_curve::LoaderConfig;
use serde::{Deserialize, Serialize};
use spectral_engine::ExtractorConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "LCINDEX";

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding one light-curve CSV per series
    pub input_dir: PathBuf,
    /// Feature table artifact
    pub feature_table_path: PathBuf,
    /// Inverse index artifact
    pub inverse_index_path: PathBuf,
    /// Concurrent series computations. A timed-out series frees its slot
    /// at once; its blocking thread finishes in the background.
    pub workers: usize,
    /// Per-series budget for loading and extraction (ms)
    pub series_timeout_ms: u64,
    /// Column mapping
    pub loader: LoaderConfig,
    /// Spectral feature parameters
    pub extractor: ExtractorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            feature_table_path: PathBuf::from("rounded_power.csv"),
            inverse_index_path: PathBuf::from("binned_inverse_index.csv"),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            series_timeout_ms: 30_000,
            loader: LoaderConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from an optional file plus the process environment.
    ///
    /// The result is not validated so that callers can apply their own
    /// overrides first.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self::load_with(path, env)
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, PipelineError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            debug!("Reading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        Ok(builder.add_source(env).build()?.try_deserialize()?)
    }

    /// Reject parameter combinations the pipeline cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        let extractor = &self.extractor;
        if extractor.top_k == 0 {
            return Err(invalid("extractor.top_k must be at least 1"));
        }
        if extractor.min_observations < 2 {
            return Err(invalid(format!(
                "extractor.min_observations must be at least 2, got {}",
                extractor.min_observations
            )));
        }
        if extractor.decimals > 15 {
            return Err(invalid(format!(
                "extractor.decimals must be at most 15, got {}",
                extractor.decimals
            )));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1"));
        }
        if self.series_timeout_ms == 0 {
            return Err(invalid("series_timeout_ms must be positive"));
        }
        extractor
            .grid
            .validate()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> PipelineError {
    PipelineError::InvalidConfig(reason.into())
}
