//! Pipeline Runner
//!
//! Series are processed on a bounded pool of blocking workers. Each one is
//! loaded and reduced to a feature vector under a timeout; a series that
//! runs out of time has its cancel flag raised so the worker stops at the
//! next frequency. Results are folded into the feature table in identifier
//! order, so the output never depends on completion order.
//!
//! A timed-out series releases its worker slot immediately, while its
//! blocking thread runs on until the next cancellation check. A load that
//! stalls inside the source keeps that thread busy, so the number of live
//! blocking threads can briefly exceed `workers`.

use crate::config::PipelineConfig;
use crate::report::RunReport;
use crate::PipelineError;
use feature_index::{FeatureTable, InverseIndex, TableError};
use light_curve::{CsvSeriesReader, DirectorySource, LoadError, SeriesSource};
use result_writer::{read_feature_table, ResultWriter};
use spectral_engine::{FeatureVector, SpectralError, SpectralFeatureExtractor};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// What became of one discovered series
#[derive(Debug)]
enum Outcome {
    Features(FeatureVector),
    Load(LoadError),
    Spectral(SpectralError),
    TimedOut,
    WorkerPanic(String),
}

#[derive(Debug)]
struct SeriesResult {
    /// Position in discovery order, breaks ties between repeated identifiers
    position: usize,
    identifier: String,
    outcome: Outcome,
}

/// Artifacts of a completed run
#[derive(Debug)]
pub struct RunOutput {
    pub table: FeatureTable,
    pub index: InverseIndex,
    pub report: RunReport,
}

/// Inverse index pipeline
pub struct Pipeline {
    config: PipelineConfig,
    extractor: Arc<SpectralFeatureExtractor>,
}

impl Pipeline {
    /// Create a pipeline; no work happens until a run is started
    pub fn new(config: PipelineConfig) -> Self {
        let extractor = Arc::new(SpectralFeatureExtractor::new(config.extractor.clone()));
        Self { config, extractor }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Source reading the configured input directory
    pub fn directory_source(&self) -> DirectorySource {
        DirectorySource::new(
            &self.config.input_dir,
            CsvSeriesReader::new(self.config.loader.clone()),
        )
    }

    /// Build the feature table from every series the source provides
    pub async fn extract(
        &self,
        source: Arc<dyn SeriesSource>,
    ) -> Result<(FeatureTable, RunReport), PipelineError> {
        self.config.validate()?;

        info!("Discovering series in {}", source.describe());
        let identifiers = source.discover()?;
        let mut report = RunReport {
            discovered: identifiers.len(),
            ..Default::default()
        };
        info!(
            "Extracting features from {} series with {} workers",
            report.discovered, self.config.workers
        );

        let limit = Duration::from_millis(self.config.series_timeout_ms);
        let mut pending = identifiers.into_iter().enumerate();
        let mut tasks = JoinSet::new();
        let mut results = Vec::with_capacity(report.discovered);

        loop {
            while tasks.len() < self.config.workers {
                let Some((position, identifier)) = pending.next() else {
                    break;
                };
                tasks.spawn(process_series(
                    Arc::clone(&source),
                    Arc::clone(&self.extractor),
                    position,
                    identifier,
                    limit,
                ));
            }

            match tasks.join_next().await {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) => {
                    // the series behind a lost task is unknown, but it still counts
                    error!("Worker task failed: {}", e);
                    report.spectral_failures += 1;
                }
                None => break,
            }
        }

        results.sort_by(|a, b| {
            a.identifier
                .cmp(&b.identifier)
                .then(a.position.cmp(&b.position))
        });

        let mut table = FeatureTable::new(self.extractor.config().top_k);
        for result in results {
            self.fold(&mut table, &mut report, result)?;
        }

        info!(
            "Feature table holds {} of {} series",
            report.retained, report.discovered
        );
        Ok((table, report))
    }

    /// Extract, build the inverse index and persist both artifacts
    pub async fn run(&self, source: Arc<dyn SeriesSource>) -> Result<RunOutput, PipelineError> {
        let (table, mut report) = self.extract(source).await?;

        let index = InverseIndex::build(&table);
        report.index_entries = Some(index.len());

        let writer = ResultWriter::new(
            &self.config.feature_table_path,
            &self.config.inverse_index_path,
        );
        writer.write_all(&table, &index)?;

        report.log_summary();
        Ok(RunOutput {
            table,
            index,
            report,
        })
    }

    fn fold(
        &self,
        table: &mut FeatureTable,
        report: &mut RunReport,
        result: SeriesResult,
    ) -> Result<(), PipelineError> {
        let identifier = result.identifier;
        match result.outcome {
            Outcome::Features(vector) => match table.add(vector) {
                Ok(()) => {
                    debug!("{}: retained", identifier);
                    report.retained += 1;
                }
                Err(TableError::DuplicateIdentifier(_)) => {
                    warn!("{}: duplicate identifier, keeping the first", identifier);
                    report.duplicates += 1;
                }
                Err(e @ TableError::ReservedSeparator(_)) => {
                    warn!("{}: skipped: {}", identifier, e);
                    report.rejected_identifiers += 1;
                }
                Err(e) => return Err(e.into()),
            },
            Outcome::Load(e) => {
                warn!("{}: unreadable, skipped: {}", identifier, e);
                report.parse_failures += 1;
            }
            Outcome::Spectral(e) if e.is_insufficient_data() => {
                warn!("{}: excluded: {}", identifier, e);
                report.insufficient_data += 1;
            }
            Outcome::Spectral(e) => {
                warn!("{}: spectral computation failed: {}", identifier, e);
                report.spectral_failures += 1;
            }
            Outcome::TimedOut => {
                warn!(
                    "{}: timed out after {}ms",
                    identifier, self.config.series_timeout_ms
                );
                report.timeouts += 1;
            }
            Outcome::WorkerPanic(reason) => {
                warn!("{}: worker panicked: {}", identifier, reason);
                report.spectral_failures += 1;
            }
        }
        Ok(())
    }
}

async fn process_series(
    source: Arc<dyn SeriesSource>,
    extractor: Arc<SpectralFeatureExtractor>,
    position: usize,
    identifier: String,
    limit: Duration,
) -> SeriesResult {
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);
    let worker_identifier = identifier.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let series = match source.load(&worker_identifier) {
            Ok(series) => series,
            Err(e) => return Outcome::Load(e),
        };
        if worker_cancel.load(Ordering::Relaxed) {
            return Outcome::Spectral(SpectralError::Cancelled);
        }
        match extractor.extract_cancellable(&series, &worker_cancel) {
            Ok(vector) => Outcome::Features(vector),
            Err(e) => Outcome::Spectral(e),
        }
    });

    let outcome = match timeout(limit, handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => Outcome::WorkerPanic(e.to_string()),
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            Outcome::TimedOut
        }
    };

    SeriesResult {
        position,
        identifier,
        outcome,
    }
}

/// Rebuild only the inverse index from a persisted feature table
pub fn rebuild_index(feature_table: &Path, output: &Path) -> Result<InverseIndex, PipelineError> {
    let table = read_feature_table(feature_table)?;
    let index = InverseIndex::build(&table);
    ResultWriter::new(feature_table, output).write_inverse_index(&index)?;
    Ok(index)
}
