//! Feature Table

use crate::error::TableError;
use serde::{Deserialize, Serialize};
use spectral_engine::FeatureVector;
use std::collections::HashSet;

/// Joins identifiers sharing an inverse-index entry, so never part of one
pub const IDENTIFIER_SEPARATOR: &str = ";";

/// One identifier with its ranked values, the persisted column layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub identifier: String,
    pub values: Vec<f64>,
}

/// Write-once table of feature vectors in insertion order.
///
/// Every vector has exactly `top_k` finite values and every identifier
/// appears at most once; a duplicate is rejected, never overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    top_k: usize,
    vectors: Vec<FeatureVector>,
    identifiers: HashSet<String>,
}

impl FeatureTable {
    pub fn new(top_k: usize) -> Self {
        Self {
            top_k,
            vectors: Vec::new(),
            identifiers: HashSet::new(),
        }
    }

    /// Append a vector
    pub fn add(&mut self, vector: FeatureVector) -> Result<(), TableError> {
        if vector.powers.len() != self.top_k {
            return Err(TableError::WrongLength {
                identifier: vector.identifier,
                expected: self.top_k,
                got: vector.powers.len(),
            });
        }
        if vector.identifier.contains(IDENTIFIER_SEPARATOR) {
            return Err(TableError::ReservedSeparator(vector.identifier));
        }
        if vector.powers.iter().any(|p| !p.is_finite()) {
            return Err(TableError::NonFiniteValue(vector.identifier));
        }
        if self.identifiers.contains(&vector.identifier) {
            return Err(TableError::DuplicateIdentifier(vector.identifier));
        }

        self.identifiers.insert(vector.identifier.clone());
        self.vectors.push(vector);
        Ok(())
    }

    /// Rebuild a table from its columnar form; K is taken from the first column
    pub fn from_columns(columns: Vec<FeatureColumn>) -> Result<Self, TableError> {
        let top_k = columns.first().map(|c| c.values.len()).unwrap_or(0);
        let mut table = Self::new(top_k);
        for column in columns {
            table.add(FeatureVector::new(column.identifier, column.values))?;
        }
        Ok(table)
    }

    /// K
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&FeatureVector> {
        self.vectors.iter().find(|v| v.identifier == identifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.vectors.iter()
    }

    /// Identifiers in table order
    pub fn identifiers(&self) -> Vec<&str> {
        self.vectors.iter().map(|v| v.identifier.as_str()).collect()
    }

    /// One column per identifier, values in descending rank order
    pub fn to_columns(&self) -> Vec<FeatureColumn> {
        self.vectors
            .iter()
            .map(|v| FeatureColumn {
                identifier: v.identifier.clone(),
                values: v.powers.clone(),
            })
            .collect()
    }

    /// Row `r` holds the rank-`r` value of every column, in table order
    pub fn rank_rows(&self) -> Vec<Vec<f64>> {
        (0..self.top_k)
            .map(|rank| self.vectors.iter().map(|v| v.powers[rank]).collect())
            .collect()
    }
}
