//! Artifact Writer

use crate::codec::{decode_feature_table, encode_feature_table, encode_inverse_index};
use crate::WriteError;
use feature_index::{FeatureTable, InverseIndex};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Writes the two run artifacts to fixed destinations
#[derive(Debug, Clone)]
pub struct ResultWriter {
    feature_table_path: PathBuf,
    inverse_index_path: PathBuf,
}

impl ResultWriter {
    pub fn new(
        feature_table_path: impl Into<PathBuf>,
        inverse_index_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            feature_table_path: feature_table_path.into(),
            inverse_index_path: inverse_index_path.into(),
        }
    }

    pub fn feature_table_path(&self) -> &Path {
        &self.feature_table_path
    }

    pub fn inverse_index_path(&self) -> &Path {
        &self.inverse_index_path
    }

    /// Persist the feature table
    pub fn write_feature_table(&self, table: &FeatureTable) -> Result<(), WriteError> {
        let bytes = encode_feature_table(table)?;
        atomic_write(&self.feature_table_path, &bytes)?;
        info!(
            "Wrote feature table ({} series, K={}) to {}",
            table.len(),
            table.top_k(),
            self.feature_table_path.display()
        );
        Ok(())
    }

    /// Persist the inverse index
    pub fn write_inverse_index(&self, index: &InverseIndex) -> Result<(), WriteError> {
        let bytes = encode_inverse_index(index)?;
        atomic_write(&self.inverse_index_path, &bytes)?;
        info!(
            "Wrote inverse index ({} values) to {}",
            index.len(),
            self.inverse_index_path.display()
        );
        Ok(())
    }

    /// Persist both artifacts, table first
    pub fn write_all(&self, table: &FeatureTable, index: &InverseIndex) -> Result<(), WriteError> {
        self.write_feature_table(table)?;
        self.write_inverse_index(index)
    }
}

/// Replace `path` with `bytes` via a temporary file in the same directory
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    debug!("Persisted {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Write any serializable value as pretty JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    atomic_write(path, &bytes)
}

/// Load a feature table previously written by [`ResultWriter`]
pub fn read_feature_table(path: &Path) -> Result<FeatureTable, WriteError> {
    let file = File::open(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = decode_feature_table(BufReader::new(file))?;
    debug!("Read {} series from {}", table.len(), path.display());
    Ok(table)
}
