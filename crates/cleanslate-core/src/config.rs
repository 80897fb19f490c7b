//! Scan and scoring configuration types.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

const MIB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Files at or above this size get the maximum size term (50 MiB).
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 50 * MIB;

/// Files at least this many days old get the maximum age term.
pub const DEFAULT_OLD_FILE_DAYS: u64 = 180;

/// Files below this size score 0 on the size axis (64 KiB).
pub const DEFAULT_MIN_SCORED_SIZE: u64 = 64 * 1024;

/// Number of leading bytes hashed into a fingerprint (4 MiB).
pub const DEFAULT_FINGERPRINT_PREFIX: u64 = 4 * MIB;

/// Number of failing paths kept as samples in a failure summary.
pub const DEFAULT_FAILURE_SAMPLES: usize = 20;

/// Upper bound of the size and age terms.
pub const MAX_TERM: i64 = 10;

/// Magnitude bound of the learned extension bias.
pub const MAX_BIAS: i64 = 10;

/// Configuration for walking a directory tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Glob patterns matched against entry names; matching entries are skipped
    /// and matching directories are not descended into.
    #[builder(default)]
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Number of threads for directory reads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// How many failing paths to keep as samples in the failure summary.
    #[builder(default = "DEFAULT_FAILURE_SAMPLES")]
    #[serde(default = "default_failure_samples")]
    pub failure_sample_limit: usize,
}

fn default_true() -> bool {
    true
}

fn default_failure_samples() -> usize {
    DEFAULT_FAILURE_SAMPLES
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
            ignore_patterns: Vec::new(),
            threads: 0,
            include_hidden: true,
            failure_sample_limit: DEFAULT_FAILURE_SAMPLES,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Thresholds shared by the scoring engine, the duplicate grouper and the
/// result filters.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct EngineConfig {
    /// Size at which the size term saturates and a file counts as "large".
    #[builder(default = "DEFAULT_LARGE_FILE_THRESHOLD")]
    pub large_file_threshold: u64,

    /// Age in days at which the age term saturates and a file counts as "old".
    #[builder(default = "DEFAULT_OLD_FILE_DAYS")]
    pub old_file_days: u64,

    /// Files smaller than this score 0 on the size axis.
    #[builder(default = "DEFAULT_MIN_SCORED_SIZE")]
    pub min_scored_size: u64,

    /// Number of leading bytes hashed into a fingerprint.
    #[builder(default = "DEFAULT_FINGERPRINT_PREFIX")]
    pub fingerprint_prefix: u64,

    /// Confirm prefix matches between files larger than the prefix by hashing
    /// their full content.
    #[builder(default = "true")]
    pub verify_large_candidates: bool,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.large_file_threshold == Some(0) {
            return Err("Large file threshold must be positive".to_string());
        }
        if self.old_file_days == Some(0) {
            return Err("Old file threshold must be at least one day".to_string());
        }
        if self.fingerprint_prefix == Some(0) {
            return Err("Fingerprint prefix must be positive".to_string());
        }
        let large = self
            .large_file_threshold
            .unwrap_or(DEFAULT_LARGE_FILE_THRESHOLD);
        let min = self.min_scored_size.unwrap_or(DEFAULT_MIN_SCORED_SIZE);
        if min > large {
            return Err(format!(
                "Minimum scored size ({min}) exceeds the large file threshold ({large})"
            ));
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Create a new engine config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Age threshold as a duration.
    pub fn old_file_threshold(&self) -> Duration {
        Duration::from_secs(self.old_file_days.saturating_mul(SECS_PER_DAY))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            old_file_days: DEFAULT_OLD_FILE_DAYS,
            min_scored_size: DEFAULT_MIN_SCORED_SIZE,
            fingerprint_prefix: DEFAULT_FINGERPRINT_PREFIX,
            verify_large_candidates: true,
        }
    }
}
