//! Inverse Index Construction
//!
//! Groups identifiers by exact equality of their already-rounded power
//! values. No tolerance is applied: rounding upstream is the only
//! discretization.

use crate::table::FeatureTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A distinct value and every identifier whose vector contains it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub value: f64,
    /// In feature-table order, without repeats
    pub identifiers: Vec<String>,
}

/// Entries in ascending value order, one per distinct value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InverseIndex {
    entries: Vec<IndexEntry>,
}

impl InverseIndex {
    /// Build the index from a feature table
    pub fn build(table: &FeatureTable) -> Self {
        // (value, column) pairs sorted by value then column keeps
        // identifier order within an entry equal to table order
        let mut pairs: Vec<(f64, usize)> = table
            .iter()
            .enumerate()
            .flat_map(|(column, vector)| vector.powers.iter().map(move |&p| (p, column)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let identifiers = table.identifiers();
        let mut entries: Vec<IndexEntry> = Vec::new();
        let mut last_column = None;

        for (value, column) in pairs {
            match entries.last_mut() {
                Some(entry) if entry.value == value => {
                    if last_column != Some(column) {
                        entry.identifiers.push(identifiers[column].to_string());
                    }
                }
                _ => entries.push(IndexEntry {
                    value,
                    identifiers: vec![identifiers[column].to_string()],
                }),
            }
            last_column = Some(column);
        }

        debug!(
            "Built inverse index: {} distinct values over {} series",
            entries.len(),
            table.len()
        );
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for an exact value
    pub fn get(&self, value: f64) -> Option<&IndexEntry> {
        self.entries
            .binary_search_by(|e| e.value.total_cmp(&value))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Identifiers sharing at least one value with `identifier`, excluding itself,
    /// in first-seen order
    pub fn neighbors(&self, identifier: &str) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !entry.identifiers.iter().any(|id| id == identifier) {
                continue;
            }
            for id in &entry.identifiers {
                if id != identifier && !seen.contains(&id.as_str()) {
                    seen.push(id);
                }
            }
        }
        seen
    }
}
