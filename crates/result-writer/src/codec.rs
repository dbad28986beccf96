//! CSV Encoding

use crate::WriteError;
use feature_index::{FeatureColumn, FeatureTable, InverseIndex, IDENTIFIER_SEPARATOR};
use std::io::Read;

/// Header of identifiers, then one row per rank
pub fn encode_feature_table(table: &FeatureTable) -> Result<Vec<u8>, WriteError> {
    if table.is_empty() {
        return Ok(Vec::new());
    }

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(table.identifiers())?;
    for row in table.rank_rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    into_bytes(wtr)
}

/// No header; `value,id1;id2;...` per row in ascending value order
pub fn encode_inverse_index(index: &InverseIndex) -> Result<Vec<u8>, WriteError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for entry in index.iter() {
        wtr.write_record([
            entry.value.to_string(),
            entry.identifiers.join(IDENTIFIER_SEPARATOR),
        ])?;
    }
    into_bytes(wtr)
}

/// Parse the persisted feature-table layout back into a table
pub fn decode_feature_table<R: Read>(reader: R) -> Result<FeatureTable, WriteError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Ok(FeatureTable::new(0));
    }

    let mut columns: Vec<FeatureColumn> = headers
        .iter()
        .map(|identifier| FeatureColumn {
            identifier: identifier.to_string(),
            values: Vec::new(),
        })
        .collect();

    for (rank, record) in rdr.records().enumerate() {
        let record = record?;
        for (column, raw) in columns.iter_mut().zip(record.iter()) {
            let value: f64 = raw.parse().map_err(|_| {
                WriteError::MalformedTable(format!(
                    "rank {} of `{}`: `{}` is not a number",
                    rank, column.identifier, raw
                ))
            })?;
            column.values.push(value);
        }
    }

    FeatureTable::from_columns(columns).map_err(|e| WriteError::MalformedTable(e.to_string()))
}

fn into_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, WriteError> {
    wtr.into_inner()
        .map_err(|e| WriteError::Csv(csv::Error::from(e.into_error())))
}
