//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DEFAULT_FAILURE_SAMPLES;

/// Fatal errors that abort a whole scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for the root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error on the root path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scan was cancelled before it completed.
    #[error("Scan cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error reading a file or directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
}

/// Non-fatal, per-entry failure encountered during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a read error warning.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Read error: {error}"),
            path,
            kind: WarningKind::ReadError,
        }
    }

    /// Classify an I/O error hit while reading an entry.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::read_error(path, error),
        }
    }
}

/// Aggregated per-entry failures of one scan: a total count plus a bounded
/// sample of the failing entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSummary {
    /// Total number of failed entries.
    pub count: u64,
    /// The first failures, at most `sample_limit` of them.
    pub samples: Vec<ScanWarning>,
    /// Maximum number of samples kept.
    pub sample_limit: usize,
}

impl FailureSummary {
    /// Create an empty summary keeping at most `sample_limit` samples.
    pub fn new(sample_limit: usize) -> Self {
        Self {
            count: 0,
            samples: Vec::new(),
            sample_limit,
        }
    }

    /// Record one failure.
    pub fn record(&mut self, warning: ScanWarning) {
        self.count += 1;
        if self.samples.len() < self.sample_limit {
            self.samples.push(warning);
        }
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: FailureSummary) {
        self.count += other.count;
        let room = self.sample_limit.saturating_sub(self.samples.len());
        self.samples.extend(other.samples.into_iter().take(room));
    }

    /// Check if nothing failed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Check if a path is among the sampled failures.
    pub fn contains(&self, path: &std::path::Path) -> bool {
        self.samples.iter().any(|w| w.path == path)
    }
}

impl Default for FailureSummary {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_warning_classification() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::from_io("/test/path", &denied);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);
        assert!(warning.message.contains("Permission denied"));

        let other = std::io::Error::other("disk on fire");
        assert_eq!(
            ScanWarning::from_io("/test/path", &other).kind,
            WarningKind::ReadError
        );
    }

    #[test]
    fn test_failure_summary_bounds_samples() {
        let mut summary = FailureSummary::new(2);
        for i in 0..5 {
            summary.record(ScanWarning::permission_denied(format!("/f{i}")));
        }
        assert_eq!(summary.count, 5);
        assert_eq!(summary.samples.len(), 2);
        assert!(summary.contains(std::path::Path::new("/f0")));
        assert!(!summary.contains(std::path::Path::new("/f4")));

        let mut other = FailureSummary::new(2);
        other.record(ScanWarning::permission_denied("/g"));
        summary.merge(other);
        assert_eq!(summary.count, 6);
        assert_eq!(summary.samples.len(), 2);
    }
}
