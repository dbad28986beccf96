//! Light-Curve Inverse Index Pipeline
//!
//! Discovers light curves, extracts their rounded top-K Lomb-Scargle powers
//! on a bounded worker pool, and persists the feature table together with
//! the inverse index built from it.

mod config;
mod report;
mod runner;

pub use self::config::{PipelineConfig, ENV_PREFIX};
pub use self::report::RunReport;
pub use self::runner::{rebuild_index, Pipeline, RunOutput};

use feature_index::TableError;
use light_curve::LoadError;
use result_writer::WriteError;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Fatal pipeline errors; per-series failures are counted in [`RunReport`]
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("discovery failed: {0}")]
    Discovery(#[from] LoadError),
    #[error("write failed: {0}")]
    Write(#[from] WriteError),
    #[error("feature table error: {0}")]
    Table(#[from] TableError),
}

/// Initialize logging; `RUST_LOG` overrides the default `info` level
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("logging already initialized: {}", e);
    }
}
