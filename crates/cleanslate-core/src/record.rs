//! File records produced by a scan.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// BLAKE3 content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Content fingerprint used to detect probable duplicates.
///
/// Two files share a fingerprint only if they have the same exact size and the
/// same hash over their leading bytes. `full` is filled in when a prefix match
/// between files larger than the prefix had to be confirmed by hashing the
/// whole content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Exact file size in bytes.
    pub size: u64,
    /// Hash of the first bytes of the file (the whole file when smaller).
    pub prefix: ContentHash,
    /// Hash of the whole content, for confirmed large files.
    pub full: Option<ContentHash>,
}

impl Fingerprint {
    /// Create a prefix-only fingerprint.
    pub fn new(size: u64, prefix: ContentHash) -> Self {
        Self {
            size,
            prefix,
            full: None,
        }
    }

    /// Attach a full-content hash.
    pub fn confirmed(self, full: ContentHash) -> Self {
        Self {
            full: Some(full),
            ..self
        }
    }

    /// Short display form (first 12 hex digits of the deciding hash).
    pub fn short_hex(&self) -> String {
        let hash = self.full.unwrap_or(self.prefix);
        let mut hex = hash.to_hex();
        hex.truncate(12);
        hex
    }
}

/// The three independently bounded terms of a suggestion score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTerms {
    /// Size term, 0..=10.
    pub size: i64,
    /// Age term, 0..=10.
    pub age: i64,
    /// Learned extension bias, -10..=10.
    pub bias: i64,
}

impl ScoreTerms {
    /// Sum of the terms.
    pub fn total(&self) -> i64 {
        self.size + self.age + self.bias
    }
}

/// One file observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes at scan time.
    pub size_bytes: u64,
    /// Last modification time.
    pub modified_at: SystemTime,
    /// Lowercase extension including the leading dot, or empty.
    pub extension: CompactString,
    /// Content fingerprint (absent if the file could not be hashed).
    pub fingerprint: Option<Fingerprint>,
    /// Number of records in this scan sharing the fingerprint, this one
    /// included. Absent when the record has no fingerprint.
    pub duplicate_group_size: Option<usize>,
    /// Score components.
    pub terms: ScoreTerms,
    /// Suggestion score (sum of the terms).
    pub score: i64,
}

impl FileRecord {
    /// Create an unscored, unfingerprinted record.
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, modified_at: SystemTime) -> Self {
        let path = path.into();
        let extension = normalize_extension(&path);
        Self {
            path,
            size_bytes,
            modified_at,
            extension,
            fingerprint: None,
            duplicate_group_size: None,
            terms: ScoreTerms::default(),
            score: 0,
        }
    }

    /// Set the score terms and the derived score.
    pub fn set_terms(&mut self, terms: ScoreTerms) {
        self.terms = terms;
        self.score = terms.total();
    }

    /// Check if another record in the scan shares this record's fingerprint.
    pub fn has_duplicates(&self) -> bool {
        self.duplicate_group_size.is_some_and(|n| n > 1)
    }

    /// Time since last modification, zero for future timestamps.
    pub fn age(&self, reference_time: SystemTime) -> Duration {
        reference_time
            .duration_since(self.modified_at)
            .unwrap_or(Duration::ZERO)
    }

    /// Check if the file is at or above the large-file threshold.
    pub fn is_large(&self, config: &EngineConfig) -> bool {
        self.size_bytes >= config.large_file_threshold
    }

    /// Check if the file is at or above the old-file threshold.
    pub fn is_old(&self, config: &EngineConfig, reference_time: SystemTime) -> bool {
        self.age(reference_time) >= config.old_file_threshold()
    }

    /// File name for display.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }
}

/// Normalize a path's extension: lowercase, with a leading dot, empty when the
/// file has none. Dotfiles such as `.bashrc` have no extension.
pub fn normalize_extension(path: &Path) -> CompactString {
    match path.extension() {
        Some(ext) if !ext.is_empty() => {
            format_compact!(".{}", ext.to_string_lossy().to_lowercase())
        }
        _ => CompactString::default(),
    }
}
