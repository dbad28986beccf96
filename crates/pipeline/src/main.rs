//! Light Curve Index - Main Entry Point
//!
//! Usage:
//!   lightcurve-index build --input-dir <dir> [--report run.json]
//!   lightcurve-index index --feature-table rounded_power.csv --output binned_inverse_index.csv

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pipeline::{init_logging, rebuild_index, Pipeline, PipelineConfig};
use result_writer::write_json;
use spectral_engine::PeriodogramMethod;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "lightcurve-index", version)]
#[command(about = "Inverse index of light curves keyed by rounded Lomb-Scargle powers")]
struct Cli {
    /// Configuration file (TOML, YAML, JSON, ...)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract features from every light curve and write both artifacts
    Build(BuildArgs),
    /// Rebuild the inverse index from an existing feature table
    Index(IndexArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Directory of light-curve CSV files
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Number of strongest powers kept per series
    #[arg(long)]
    top_k: Option<usize>,

    /// Series with fewer observations are excluded
    #[arg(long)]
    min_observations: Option<usize>,

    /// Rounding precision in decimal places
    #[arg(long)]
    decimals: Option<u32>,

    /// Concurrent series computations
    #[arg(long)]
    workers: Option<usize>,

    /// Per-series timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Periodogram method: exact, fast or auto
    #[arg(long)]
    method: Option<PeriodogramMethod>,

    /// Feature table output path
    #[arg(long)]
    feature_table: Option<PathBuf>,

    /// Inverse index output path
    #[arg(long)]
    inverse_index: Option<PathBuf>,

    /// Write the run report as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl BuildArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(k) = self.top_k {
            config.extractor.top_k = k;
        }
        if let Some(n) = self.min_observations {
            config.extractor.min_observations = n;
        }
        if let Some(d) = self.decimals {
            config.extractor.decimals = d;
        }
        if let Some(w) = self.workers {
            config.workers = w;
        }
        if let Some(ms) = self.timeout_ms {
            config.series_timeout_ms = ms;
        }
        if let Some(method) = self.method {
            config.extractor.method = method;
        }
        if let Some(path) = &self.feature_table {
            config.feature_table_path = path.clone();
        }
        if let Some(path) = &self.inverse_index {
            config.inverse_index_path = path.clone();
        }
    }
}

#[derive(Args, Debug)]
struct IndexArgs {
    /// Feature table to read (defaults to the configured path)
    #[arg(long)]
    feature_table: Option<PathBuf>,

    /// Inverse index to write (defaults to the configured path)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    info!("=== Light Curve Index v{} ===", env!("CARGO_PKG_VERSION"));

    let mut config =
        PipelineConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Command::Build(args) => {
            args.apply(&mut config);
            config.validate()?;

            let pipeline = Pipeline::new(config);
            let source = Arc::new(pipeline.directory_source());
            let output = pipeline.run(source).await?;

            if let Some(path) = &args.report {
                write_json(path, &output.report)
                    .with_context(|| format!("failed to write report to {}", path.display()))?;
                info!("Wrote run report to {}", path.display());
            }
        }
        Command::Index(args) => {
            let table_path = args.feature_table.unwrap_or(config.feature_table_path);
            let output_path = args.output.unwrap_or(config.inverse_index_path);
            let index = rebuild_index(&table_path, &output_path)?;
            info!(
                "Rebuilt inverse index with {} values from {}",
                index.len(),
                table_path.display()
            );
        }
    }

    Ok(())
}
