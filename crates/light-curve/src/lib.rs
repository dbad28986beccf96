//! Light-Curve Loading
//!
//! Discovers light-curve tables, parses them into time series and drops
//! unusable rows and files.

mod error;
mod reader;
mod series;
mod source;

pub use error::{LoadError, RowRejection};
pub use reader::{CsvSeriesReader, LoaderConfig};
pub use series::{Observation, TimeSeries};
pub use source::{DirectorySource, MemorySource, SeriesSource};
