//! Core types and configuration for cleanslate.
//!
//! This crate provides the data model shared by every stage of the
//! scan-score-learn engine: file records and their fingerprints, learning
//! records, thresholds, result filters and the scan error taxonomy.

mod config;
mod error;
mod filter;
mod learning;
mod record;

pub use config::{
    DEFAULT_FAILURE_SAMPLES, DEFAULT_FINGERPRINT_PREFIX, DEFAULT_LARGE_FILE_THRESHOLD,
    DEFAULT_MIN_SCORED_SIZE, DEFAULT_OLD_FILE_DAYS, EngineConfig, EngineConfigBuilder, MAX_BIAS,
    MAX_TERM, ScanConfig, ScanConfigBuilder,
};
pub use error::{FailureSummary, ScanError, ScanWarning, WarningKind};
pub use filter::ResultFilter;
pub use learning::{Action, ActionRecord, ExtStat, bias_for};
pub use record::{ContentHash, FileRecord, Fingerprint, ScoreTerms, normalize_extension};
