//! CSV Light-Curve Reader

use crate::error::{LoadError, RowRejection};
use crate::series::{Observation, TimeSeries};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Column mapping for light-curve tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Time column (MJD)
    pub time_column: String,
    /// Magnitude column
    pub magnitude_column: String,
    /// Optional uncertainty column; when set, rows without a positive
    /// uncertainty are dropped and the periodogram is weighted
    pub error_column: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            time_column: "mjd".to_string(),
            magnitude_column: "mag".to_string(),
            error_column: None,
        }
    }
}

/// Parses headered CSV files into [`TimeSeries`]
#[derive(Debug, Clone, Default)]
pub struct CsvSeriesReader {
    config: LoaderConfig,
}

struct ColumnIndices {
    time: usize,
    magnitude: usize,
    error: Option<usize>,
}

impl CsvSeriesReader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read a file, using its base name as the identifier
    pub fn read_path(&self, path: &Path) -> Result<TimeSeries, LoadError> {
        let identifier = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path)?;
        self.read_from(&identifier, file)
    }

    /// Read CSV content from any reader
    pub fn read_from<R: Read>(&self, identifier: &str, reader: R) -> Result<TimeSeries, LoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(LoadError::Empty);
        }
        let columns = self.resolve_columns(&headers)?;

        let mut observations = Vec::new();
        let mut rejected = 0usize;
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            match Self::parse_row(&record, &columns) {
                Ok(observation) => observations.push(observation),
                Err(reason) => {
                    debug!("{}: dropping row {}: {}", identifier, row + 1, reason);
                    rejected += 1;
                }
            }
        }

        if rejected > 0 {
            debug!(
                "{}: kept {} rows, dropped {}",
                identifier,
                observations.len(),
                rejected
            );
        }
        if observations.is_empty() {
            return Err(LoadError::Empty);
        }

        TimeSeries::from_observations(identifier, &observations)
    }

    fn resolve_columns(&self, headers: &csv::StringRecord) -> Result<ColumnIndices, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };

        Ok(ColumnIndices {
            time: find(&self.config.time_column)?,
            magnitude: find(&self.config.magnitude_column)?,
            error: self.config.error_column.as_deref().map(find).transpose()?,
        })
    }

    fn parse_row(
        record: &csv::StringRecord,
        columns: &ColumnIndices,
    ) -> Result<Observation, RowRejection> {
        let time = parse_field(record, columns.time, "time")?;
        let magnitude = parse_field(record, columns.magnitude, "magnitude")?;
        let error = match columns.error {
            Some(idx) => {
                let value = parse_field(record, idx, "error")?;
                if value <= 0.0 {
                    return Err(RowRejection::NonPositiveError(value));
                }
                Some(value)
            }
            None => None,
        };

        Ok(Observation { time, magnitude, error })
    }
}

fn parse_field(
    record: &csv::StringRecord,
    idx: usize,
    field: &'static str,
) -> Result<f64, RowRejection> {
    let raw = match record.get(idx) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(RowRejection::Missing(field)),
    };
    let value: f64 = raw.parse().map_err(|_| RowRejection::Unparseable {
        field,
        raw: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(RowRejection::NonFinite { field, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZTF_SAMPLE: &str = "\
oid,mjd,mag,magerr,filtercode
1,58200.1,18.21,0.05,zg
1,58201.3,18.35,0.06,zg
1,58203.7,18.02,0.04,zg
";

    #[test]
    fn test_reads_named_columns() {
        let reader = CsvSeriesReader::default();
        let series = reader.read_from("ztf_1.csv", ZTF_SAMPLE.as_bytes()).unwrap();

        assert_eq!(series.identifier(), "ztf_1.csv");
        assert_eq!(series.times(), &[58200.1, 58201.3, 58203.7]);
        assert_eq!(series.magnitudes(), &[18.21, 18.35, 18.02]);
        assert!(series.errors().is_none());
    }

    #[test]
    fn test_reads_error_column_when_configured() {
        let reader = CsvSeriesReader::new(LoaderConfig {
            error_column: Some("magerr".to_string()),
            ..Default::default()
        });
        let series = reader.read_from("ztf_1.csv", ZTF_SAMPLE.as_bytes()).unwrap();
        assert_eq!(series.errors(), Some(&[0.05, 0.06, 0.04][..]));
    }

    #[test]
    fn test_missing_column() {
        let reader = CsvSeriesReader::default();
        let err = reader
            .read_from("bad.csv", "time,mag\n1.0,18.0\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "mjd"));
    }

    #[test]
    fn test_empty_input() {
        let reader = CsvSeriesReader::default();
        assert!(matches!(
            reader.read_from("empty.csv", "".as_bytes()),
            Err(LoadError::Empty)
        ));
        assert!(matches!(
            reader.read_from("header_only.csv", "mjd,mag\n".as_bytes()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn test_drops_bad_rows() {
        let data = "mjd,mag\n1.0,18.0\n2.0,\n3.0,NaN\nabc,18.2\n4.0,18.4\n5.0\n";
        let reader = CsvSeriesReader::default();
        let series = reader.read_from("mixed.csv", data.as_bytes()).unwrap();
        assert_eq!(series.times(), &[1.0, 4.0]);
        assert_eq!(series.magnitudes(), &[18.0, 18.4]);
    }

    #[test]
    fn test_drops_non_positive_errors() {
        let data = "mjd,mag,magerr\n1.0,18.0,0.1\n2.0,18.1,0.0\n3.0,18.2,-0.1\n";
        let reader = CsvSeriesReader::new(LoaderConfig {
            error_column: Some("magerr".to_string()),
            ..Default::default()
        });
        let series = reader.read_from("err.csv", data.as_bytes()).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_parse_field_rejections() {
        let record = csv::StringRecord::from(vec!["", "x", "inf"]);
        assert_eq!(parse_field(&record, 0, "time"), Err(RowRejection::Missing("time")));
        assert!(matches!(
            parse_field(&record, 1, "time"),
            Err(RowRejection::Unparseable { .. })
        ));
        assert!(matches!(
            parse_field(&record, 2, "time"),
            Err(RowRejection::NonFinite { .. })
        ));
        assert_eq!(parse_field(&record, 7, "time"), Err(RowRejection::Missing("time")));
    }
}
