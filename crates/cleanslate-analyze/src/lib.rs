//! Duplicate grouping and suggestion scoring for cleanslate.
//!
//! - **Duplicate grouping** - Fingerprint every file with a BLAKE3 hash of
//!   its leading bytes plus its exact size, then count how many files share
//!   each fingerprint
//! - **Scoring** - Combine bounded size, age and learned-bias terms into one
//!   integer suggestion score
//!
//! # Duplicate Grouping
//!
//! 1. Hash the first 4 MiB of every file in parallel (whole file if smaller)
//! 2. Group by (size, prefix hash) on a single thread
//! 3. Confirm groups of files larger than the prefix with a full-content hash
//!
//! ```rust,ignore
//! use cleanslate_analyze::DuplicateGrouper;
//! use cleanslate_core::EngineConfig;
//!
//! let grouper = DuplicateGrouper::new(EngineConfig::default());
//! let summary = grouper.assign(&mut records, &cancel)?;
//! println!("{} files have a duplicate", summary.duplicate_files);
//! ```
//!
//! # Scoring
//!
//! ```rust,ignore
//! use cleanslate_analyze::ScoringEngine;
//!
//! let engine = ScoringEngine::new(EngineConfig::default(), reference_time);
//! engine.score_all(&mut records, |ext| store_bias(ext));
//! ```

mod duplicates;
mod score;

pub use duplicates::{
    DuplicateGroup, DuplicateGrouper, GroupingSummary, assign_group_sizes, collect_groups,
};
pub use score::{ScoringEngine, format_age};

// Re-export core types
pub use cleanslate_core::{ContentHash, EngineConfig, FileRecord, Fingerprint, ScoreTerms};
