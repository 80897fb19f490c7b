//! Composable predicates over scan results.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::record::FileRecord;

/// A set of predicates combined with AND. The empty filter keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFilter {
    /// Keep only records that have at least one duplicate.
    pub only_duplicates: bool,
    /// Keep only records at or above the old-file threshold.
    pub only_old: bool,
    /// Keep only records at or above the large-file threshold.
    pub only_large: bool,
    /// Keep only zero-byte records.
    pub only_empty: bool,
    /// Keep only records scoring at least this much.
    pub min_score: Option<i64>,
}

impl ResultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_only_duplicates(mut self, on: bool) -> Self {
        self.only_duplicates = on;
        self
    }

    pub fn with_only_old(mut self, on: bool) -> Self {
        self.only_old = on;
        self
    }

    pub fn with_only_large(mut self, on: bool) -> Self {
        self.only_large = on;
        self
    }

    pub fn with_only_empty(mut self, on: bool) -> Self {
        self.only_empty = on;
        self
    }

    pub fn with_min_score(mut self, min_score: Option<i64>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Check if a record passes every active predicate.
    pub fn matches(
        &self,
        record: &FileRecord,
        config: &EngineConfig,
        reference_time: SystemTime,
    ) -> bool {
        (!self.only_duplicates || record.has_duplicates())
            && (!self.only_old || record.is_old(config, reference_time))
            && (!self.only_large || record.is_large(config))
            && (!self.only_empty || record.size_bytes == 0)
            && self.min_score.is_none_or(|min| record.score >= min)
    }

    /// Select the matching records, preserving order.
    pub fn apply<'a>(
        &self,
        records: &'a [FileRecord],
        config: &EngineConfig,
        reference_time: SystemTime,
    ) -> Vec<&'a FileRecord> {
        records
            .iter()
            .filter(|r| self.matches(r, config, reference_time))
            .collect()
    }
}
