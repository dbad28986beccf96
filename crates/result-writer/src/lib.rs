//! Result Persistence
//!
//! Serializes the feature table and inverse index to CSV. Every artifact is
//! written whole to a temporary file beside its destination and renamed into
//! place, so a failed run never leaves a partial file.

mod codec;
mod writer;

pub use codec::{decode_feature_table, encode_feature_table, encode_inverse_index};
pub use writer::{atomic_write, read_feature_table, write_json, ResultWriter};

use std::path::PathBuf;
use thiserror::Error;

/// Errors while persisting or reloading results
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed feature table: {0}")]
    MalformedTable(String),
}
