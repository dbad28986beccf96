//! Light-Curve Sources
//!
//! A [`SeriesSource`] enumerates identifiers and loads one series at a time,
//! so a pipeline can parse files in parallel and isolate per-file failures.
//! [`DirectorySource`] reads CSV files from disk; [`MemorySource`] serves
//! series held in memory.

use crate::error::LoadError;
use crate::reader::CsvSeriesReader;
use crate::series::TimeSeries;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Provider of light curves
pub trait SeriesSource: Send + Sync {
    /// Human-readable description for logs
    fn describe(&self) -> String;

    /// List every candidate identifier. An error here is fatal.
    fn discover(&self) -> Result<Vec<String>, LoadError>;

    /// Load a single series. Errors are per-item.
    fn load(&self, identifier: &str) -> Result<TimeSeries, LoadError>;
}

/// Regular files in a single directory (not recursive)
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    reader: CsvSeriesReader,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, reader: CsvSeriesReader) -> Self {
        Self {
            root: root.into(),
            reader,
        }
    }

    fn discovery_error(&self, reason: impl ToString) -> LoadError {
        LoadError::Discovery {
            path: self.root.clone(),
            reason: reason.to_string(),
        }
    }
}

impl SeriesSource for DirectorySource {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn discover(&self) -> Result<Vec<String>, LoadError> {
        let entries = fs::read_dir(&self.root).map_err(|e| self.discovery_error(e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.root.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            // follows symlinks
            match fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    debug!("Skipping non-file entry {}", path.display());
                    continue;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => warn!("Skipping non UTF-8 file name {:?}", name),
            }
        }

        names.sort();
        info!("Discovered {} files in {}", names.len(), self.root.display());
        Ok(names)
    }

    fn load(&self, identifier: &str) -> Result<TimeSeries, LoadError> {
        self.reader.read_path(&self.root.join(identifier))
    }
}

/// Series held in memory, served in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    order: Vec<String>,
    series: HashMap<String, TimeSeries>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series; a later series with the same identifier replaces the earlier one
    pub fn insert(&mut self, series: TimeSeries) {
        let identifier = series.identifier().to_string();
        if self.series.insert(identifier.clone(), series).is_none() {
            self.order.push(identifier);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<TimeSeries> for MemorySource {
    fn from_iter<I: IntoIterator<Item = TimeSeries>>(iter: I) -> Self {
        let mut source = Self::new();
        for series in iter {
            source.insert(series);
        }
        source
    }
}

impl SeriesSource for MemorySource {
    fn describe(&self) -> String {
        format!("{} in-memory series", self.order.len())
    }

    fn discover(&self) -> Result<Vec<String>, LoadError> {
        Ok(self.order.clone())
    }

    fn load(&self, identifier: &str) -> Result<TimeSeries, LoadError> {
        self.series
            .get(identifier)
            .cloned()
            .ok_or_else(|| LoadError::UnknownSeries(identifier.to_string()))
    }
}
