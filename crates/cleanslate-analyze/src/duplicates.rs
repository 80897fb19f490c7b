//! Duplicate grouping by content fingerprint.
//!
//! Every record gets a fingerprint: the exact size plus a BLAKE3 hash of the
//! leading `fingerprint_prefix` bytes. Records sharing a fingerprint form a
//! group. When a group contains files larger than the prefix, their full
//! content is hashed and the group is split on the result, so files that only
//! differ past the prefix are not reported.
//!
//! Hashing runs in parallel. The fingerprint -> members map is built on one
//! thread once every hash attempt has finished.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use blake3::Hasher;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cleanslate_core::{ContentHash, EngineConfig, FileRecord, Fingerprint, ScanError};

/// A set of records sharing one fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Shared fingerprint.
    pub fingerprint: Fingerprint,

    /// Paths of all members, sorted.
    pub paths: Vec<PathBuf>,

    /// Space held by the extra copies: size * (count - 1).
    pub wasted_bytes: u64,
}

impl DuplicateGroup {
    /// Get the number of files in the group.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// Check if keeping one file, how many could be deleted.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }
}

/// Counters from one grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingSummary {
    /// Records that ended up with a fingerprint.
    pub fingerprinted: usize,
    /// Records whose content could not be read.
    pub unreadable: usize,
    /// Records whose prefix match was checked against the full content.
    pub fully_hashed: usize,
    /// Number of groups with at least two members.
    pub groups: usize,
    /// Records belonging to such a group.
    pub duplicate_files: usize,
}

/// Computes fingerprints and duplicate group sizes.
pub struct DuplicateGrouper {
    config: EngineConfig,
}

impl DuplicateGrouper {
    /// Create a grouper using the given thresholds.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Fingerprint a file from its first `fingerprint_prefix` bytes.
    pub fn fingerprint(&self, path: &Path, size: u64) -> io::Result<Fingerprint> {
        let file = File::open(path)?;
        let mut hasher = Hasher::new();
        io::copy(&mut file.take(self.config.fingerprint_prefix), &mut hasher)?;
        Ok(Fingerprint::new(
            size,
            ContentHash::new(*hasher.finalize().as_bytes()),
        ))
    }

    /// Hash the whole content of a file.
    pub fn full_hash(&self, path: &Path) -> io::Result<ContentHash> {
        let mut hasher = Hasher::new();
        hasher.update_mmap_rayon(path)?;
        Ok(ContentHash::new(*hasher.finalize().as_bytes()))
    }

    /// Fingerprint every record and set its `duplicate_group_size`.
    ///
    /// Unreadable records are left without a fingerprint and are not counted
    /// in any group. The token is checked before each file; a cancelled pass
    /// returns [`ScanError::Cancelled`] and leaves the records in an
    /// unspecified state.
    pub fn assign(
        &self,
        records: &mut [FileRecord],
        cancel: &CancellationToken,
    ) -> Result<GroupingSummary, ScanError> {
        records.par_iter_mut().for_each(|record| {
            if cancel.is_cancelled() {
                return;
            }
            record.fingerprint = match self.fingerprint(&record.path, record.size_bytes) {
                Ok(fp) => Some(fp),
                Err(err) => {
                    debug!(path = %record.path.display(), error = %err, "Cannot fingerprint");
                    None
                }
            };
        });
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let mut summary = GroupingSummary::default();
        if self.config.verify_large_candidates {
            summary.fully_hashed = self.confirm_large_candidates(records, cancel)?;
        }

        let counts = assign_group_sizes(records);
        summary.fingerprinted = counts.fingerprinted;
        summary.unreadable = counts.unreadable;
        summary.groups = counts.groups;
        summary.duplicate_files = counts.duplicate_files;

        info!(
            files = records.len(),
            groups = summary.groups,
            duplicates = summary.duplicate_files,
            "Duplicate grouping complete"
        );
        Ok(summary)
    }

    /// Replace prefix-only fingerprints of colliding large files with
    /// full-content ones. Returns how many files were hashed.
    fn confirm_large_candidates(
        &self,
        records: &mut [FileRecord],
        cancel: &CancellationToken,
    ) -> Result<usize, ScanError> {
        let prefix = self.config.fingerprint_prefix;
        let candidates: Vec<usize> = records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.fingerprint.map(|fp| (fp, idx)))
            .filter(|(fp, _)| fp.size > prefix)
            .into_group_map()
            .into_values()
            .filter(|indices| indices.len() > 1)
            .flatten()
            .sorted()
            .collect();

        if candidates.is_empty() {
            return Ok(0);
        }
        debug!(files = candidates.len(), "Confirming large prefix matches");

        let view: &[FileRecord] = records;
        let hashes: Vec<(usize, Option<ContentHash>)> = candidates
            .par_iter()
            .map(|&idx| {
                if cancel.is_cancelled() {
                    return (idx, None);
                }
                let path = &view[idx].path;
                match self.full_hash(path) {
                    Ok(hash) => (idx, Some(hash)),
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "Cannot hash full content");
                        (idx, None)
                    }
                }
            })
            .collect();
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        for (idx, hash) in hashes {
            let record = &mut records[idx];
            record.fingerprint = match (record.fingerprint, hash) {
                (Some(fp), Some(full)) => Some(fp.confirmed(full)),
                _ => None,
            };
        }
        Ok(candidates.len())
    }
}

impl Default for DuplicateGrouper {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Recount `duplicate_group_size` from the fingerprints already on the
/// records. Used after grouping and whenever records leave the result set.
pub fn assign_group_sizes(records: &mut [FileRecord]) -> GroupingSummary {
    let members = records
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| r.fingerprint.map(|fp| (fp, idx)))
        .into_group_map();

    for record in records.iter_mut() {
        record.duplicate_group_size = None;
    }

    let mut summary = GroupingSummary::default();
    for indices in members.values() {
        for &idx in indices {
            records[idx].duplicate_group_size = Some(indices.len());
        }
        summary.fingerprinted += indices.len();
        if indices.len() > 1 {
            summary.groups += 1;
            summary.duplicate_files += indices.len();
        }
    }
    summary.unreadable = records.len() - summary.fingerprinted;
    summary
}

/// Collect the groups with at least two members, largest waste first.
pub fn collect_groups(records: &[FileRecord]) -> Vec<DuplicateGroup> {
    records
        .iter()
        .filter(|r| r.has_duplicates())
        .filter_map(|r| r.fingerprint.map(|fp| (fp, r.path.clone())))
        .into_group_map()
        .into_iter()
        .map(|(fingerprint, mut paths)| {
            paths.sort();
            let wasted_bytes = fingerprint.size * (paths.len() as u64 - 1);
            DuplicateGroup {
                fingerprint,
                paths,
                wasted_bytes,
            }
        })
        .sorted_by(|a, b| {
            b.wasted_bytes
                .cmp(&a.wasted_bytes)
                .then_with(|| a.paths.cmp(&b.paths))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn record(path: PathBuf) -> FileRecord {
        let size = fs::metadata(&path).unwrap().len();
        FileRecord::new(path, size, SystemTime::now())
    }

    fn small_prefix_config(prefix: u64) -> EngineConfig {
        EngineConfig::builder()
            .fingerprint_prefix(prefix)
            .min_scored_size(0u64)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fingerprint_matches_for_equal_content() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "duplicate content here").unwrap();
        fs::write(temp.path().join("b"), "duplicate content here").unwrap();
        fs::write(temp.path().join("c"), "unique content").unwrap();

        let grouper = DuplicateGrouper::default();
        let a = grouper.fingerprint(&temp.path().join("a"), 22).unwrap();
        let b = grouper.fingerprint(&temp.path().join("b"), 22).unwrap();
        let c = grouper.fingerprint(&temp.path().join("c"), 14).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_prefix_only_hashes_leading_bytes() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "same-prefix-AAAA").unwrap();
        fs::write(temp.path().join("b"), "same-prefix-BBBB").unwrap();

        let grouper = DuplicateGrouper::new(small_prefix_config(8));
        let a = grouper.fingerprint(&temp.path().join("a"), 16).unwrap();
        let b = grouper.fingerprint(&temp.path().join("b"), 16).unwrap();
        assert_eq!(a, b);
        assert_ne!(
            grouper.full_hash(&temp.path().join("a")).unwrap(),
            grouper.full_hash(&temp.path().join("b")).unwrap()
        );
    }

    #[test]
    fn test_cancelled_grouping() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "x").unwrap();
        let mut records = vec![record(temp.path().join("a"))];

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = DuplicateGrouper::default().assign(&mut records, &cancel);
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[test]
    fn test_assign_group_sizes_after_removal() {
        let now = SystemTime::now();
        let fp = Fingerprint::new(3, ContentHash::new([4; 32]));
        let mut records: Vec<FileRecord> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| {
                let mut r = FileRecord::new(*p, 3, now);
                r.fingerprint = Some(fp);
                r
            })
            .collect();
        assert_eq!(assign_group_sizes(&mut records).groups, 1);
        assert_eq!(records[0].duplicate_group_size, Some(3));

        records.remove(0);
        records.remove(0);
        let summary = assign_group_sizes(&mut records);
        assert_eq!(summary.groups, 0);
        assert_eq!(records[0].duplicate_group_size, Some(1));
    }

    #[test]
    fn test_collect_groups_orders_by_waste() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("s1"), "ab").unwrap();
        fs::write(root.join("s2"), "ab").unwrap();
        fs::write(root.join("l1"), "abcdefgh").unwrap();
        fs::write(root.join("l2"), "abcdefgh").unwrap();
        fs::write(root.join("l3"), "abcdefgh").unwrap();
        fs::write(root.join("u"), "zz").unwrap();

        let mut records: Vec<FileRecord> = ["s1", "s2", "l1", "l2", "l3", "u"]
            .iter()
            .map(|n| record(root.join(n)))
            .collect();
        DuplicateGrouper::default()
            .assign(&mut records, &CancellationToken::new())
            .unwrap();

        let groups = collect_groups(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].count(), 3);
        assert_eq!(groups[0].wasted_bytes, 16);
        assert_eq!(groups[0].deletable_count(), 2);
        assert_eq!(groups[1].wasted_bytes, 2);
    }
}
