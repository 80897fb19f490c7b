//! Filesystem walker for cleanslate.
//!
//! This crate enumerates the regular files under a root directory using jwalk
//! for parallel directory reads.
//!
//! # Overview
//!
//! - **Lazy traversal**: [`Walker::walk`] returns an iterator that yields one
//!   [`FileRecord`] per readable file as it is discovered
//! - **Per-entry failures** are yielded as [`ScanWarning`]s instead of
//!   aborting; only an inaccessible root is fatal
//! - **Never follows symlinks**, so cycles are impossible
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use cleanslate_scan::{ScanConfig, Walker};
//! use tokio_util::sync::CancellationToken;
//!
//! let walker = Walker::new();
//! let output = walker
//!     .scan(&ScanConfig::new("/path/to/scan"), &CancellationToken::new())
//!     .unwrap();
//!
//! println!("{} files, {} failures", output.records.len(), output.failures.count);
//! ```

mod progress;
mod walker;

pub use progress::ScanProgress;
pub use walker::{FileWalk, WalkOutput, Walker};

// Re-export core types for convenience
pub use cleanslate_core::{
    FailureSummary, FileRecord, ScanConfig, ScanError, ScanWarning, WarningKind,
};
