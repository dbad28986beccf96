//! Feature Table and Inverse Index
//!
//! Accumulates per-series feature vectors and inverts them into a mapping
//! from each distinct rounded power value to the series that contain it.

mod error;
mod index;
mod table;

pub use error::TableError;
pub use index::{IndexEntry, InverseIndex};
pub use table::{FeatureColumn, FeatureTable, IDENTIFIER_SEPARATOR};
