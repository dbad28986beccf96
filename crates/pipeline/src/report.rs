//! Run Report

use serde::{Deserialize, Serialize};
use tracing::info;

/// Per-run accounting of every discovered series
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Files or identifiers found by discovery
    pub discovered: usize,
    /// Unreadable or unparseable files
    pub parse_failures: usize,
    /// Series below the minimum observation count
    pub insufficient_data: usize,
    /// Series whose periodogram could not be computed
    pub spectral_failures: usize,
    /// Series that exceeded the per-series timeout
    pub timeouts: usize,
    /// Repeated identifiers, first one kept
    pub duplicates: usize,
    /// Identifiers the inverse index cannot represent
    pub rejected_identifiers: usize,
    /// Series present in the feature table
    pub retained: usize,
    /// Distinct values in the inverse index, once built
    pub index_entries: Option<usize>,
}

impl RunReport {
    /// Every discovered series accounted for exactly once
    pub fn is_balanced(&self) -> bool {
        self.discovered == self.excluded() + self.retained
    }

    pub fn excluded(&self) -> usize {
        self.parse_failures
            + self.insufficient_data
            + self.spectral_failures
            + self.timeouts
            + self.duplicates
            + self.rejected_identifiers
    }

    pub fn log_summary(&self) {
        info!(
            "Run summary: {} discovered, {} retained, {} excluded \
             (parse={}, insufficient={}, spectral={}, timeout={}, duplicate={}, \
             rejected={})",
            self.discovered,
            self.retained,
            self.excluded(),
            self.parse_failures,
            self.insufficient_data,
            self.spectral_failures,
            self.timeouts,
            self.duplicates,
            self.rejected_identifiers
        );
        if let Some(entries) = self.index_entries {
            info!("Inverse index holds {} distinct values", entries);
        }
    }
}
