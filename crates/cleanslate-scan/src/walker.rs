//! JWalk-based lazy directory walker.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use globset::{Glob, GlobSet, GlobSetBuilder};
use jwalk::{DirEntryIter, Parallelism, WalkDir};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cleanslate_core::{FailureSummary, FileRecord, ScanConfig, ScanError, ScanWarning, WarningKind};

use crate::progress::{ProgressTracker, ScanProgress};

/// Publish a progress snapshot every this many files.
const PROGRESS_INTERVAL: u64 = 1000;

/// Parallel filesystem walker.
pub struct Walker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

/// Everything a completed walk produced.
#[derive(Debug)]
pub struct WalkOutput {
    /// Canonical root that was walked.
    pub root: PathBuf,
    /// One unscored record per readable regular file.
    pub records: Vec<FileRecord>,
    /// Entries that were skipped.
    pub failures: FailureSummary,
    /// Wall time of the walk.
    pub duration: Duration,
}

impl Walker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Start a lazy walk of `config.root`.
    ///
    /// Fails only if the root itself cannot be read. Every later problem is
    /// yielded as an `Err(ScanWarning)` item and the walk goes on.
    pub fn walk(&self, config: &ScanConfig) -> Result<FileWalk, ScanError> {
        let root = check_root(&config.root)?;
        let ignore = Arc::new(build_ignore_set(&config.ignore_patterns)?);

        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root)
            .parallelism(parallelism)
            .skip_hidden(!config.include_hidden)
            .follow_links(false)
            .sort(true)
            .min_depth(0)
            .max_depth(config.max_depth.map(|d| d as usize).unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _state, children| {
                // Dropping an ignored directory here also stops descent into it.
                children.retain(|child| match child {
                    Ok(entry) => !ignore.is_match(entry.file_name()),
                    Err(_) => true,
                });
            });

        debug!(root = %root.display(), "Starting walk");

        Ok(FileWalk {
            entries: walker.into_iter(),
            tracker: ProgressTracker::new(),
            progress_tx: self.progress_tx.clone(),
            root,
        })
    }

    /// Walk `config.root` to completion, collecting records and failures.
    ///
    /// The token is checked between entries; cancelling it makes the walk
    /// return [`ScanError::Cancelled`] and drop everything collected so far.
    pub fn scan(
        &self,
        config: &ScanConfig,
        cancel: &CancellationToken,
    ) -> Result<WalkOutput, ScanError> {
        let start = Instant::now();
        let mut walk = self.walk(config)?;
        let root = walk.root().to_path_buf();
        let mut records = Vec::new();
        let mut failures = FailureSummary::new(config.failure_sample_limit);

        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        for item in walk.by_ref() {
            if cancel.is_cancelled() {
                info!(root = %root.display(), "Walk cancelled");
                return Err(ScanError::Cancelled);
            }
            match item {
                Ok(record) => records.push(record),
                Err(warning) => failures.record(warning),
            }
        }
        walk.publish();

        info!(
            root = %root.display(),
            files = records.len(),
            failures = failures.count,
            "Walk complete"
        );

        Ok(WalkOutput {
            root,
            records,
            failures,
            duration: start.elapsed(),
        })
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy sequence of the regular files under a root.
pub struct FileWalk {
    entries: DirEntryIter<((), ())>,
    tracker: ProgressTracker,
    progress_tx: broadcast::Sender<ScanProgress>,
    root: PathBuf,
}

impl FileWalk {
    /// Canonical root being walked.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current progress counters.
    pub fn progress(&self) -> ScanProgress {
        self.tracker.snapshot()
    }

    fn publish(&self) {
        // No subscribers is fine.
        let _ = self.progress_tx.send(self.tracker.snapshot());
    }

    fn skip(&mut self, warning: ScanWarning) -> Option<Result<FileRecord, ScanWarning>> {
        debug!(path = %warning.path.display(), kind = ?warning.kind, "Skipping entry");
        self.tracker.record_error();
        Some(Err(warning))
    }
}

impl Iterator for FileWalk {
    type Item = Result<FileRecord, ScanWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    return self.skip(warning_from(path, &err));
                }
            };

            let file_type = entry.file_type();
            let path = entry.path();

            if file_type.is_dir() {
                self.tracker.record_dir();
                if let Some(err) = &entry.read_children_error {
                    return self.skip(warning_from(path, err));
                }
                continue;
            }

            // Symlinks (to files or directories) and special files are never
            // followed or reported.
            if !file_type.is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    return self.skip(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                }
            };
            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(err) => {
                    return self.skip(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                }
            };

            if let Err(err) = File::open(&path) {
                return self.skip(ScanWarning::from_io(path, &err));
            }

            let size = metadata.len();
            self.tracker.record_file(path.clone(), size);
            if self.tracker.files_scanned() % PROGRESS_INTERVAL == 0 {
                self.publish();
            }

            return Some(Ok(FileRecord::new(path, size, modified)));
        }
    }
}

fn warning_from(path: PathBuf, err: &jwalk::Error) -> ScanWarning {
    match err.io_error() {
        Some(io) => ScanWarning::from_io(path, io),
        None => ScanWarning::new(path, err.to_string(), WarningKind::ReadError),
    }
}

/// Resolve the root and verify that it is a readable directory.
fn check_root(root: &Path) -> Result<PathBuf, ScanError> {
    let root_path = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

    let metadata = std::fs::metadata(&root_path)
        .map_err(|e| ScanError::io(&root_path, e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory { path: root_path });
    }

    std::fs::read_dir(&root_path)
        .map_err(|e| ScanError::io(&root_path, e))?;
    Ok(root_path)
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    patterns
        .iter()
        .try_fold(&mut GlobSetBuilder::new(), |builder, pattern| {
            let glob = Glob::new(pattern).map_err(|e| ScanError::InvalidConfig {
                message: format!("bad ignore pattern {pattern:?}: {e}"),
            })?;
            Ok::<_, ScanError>(builder.add(glob))
        })?
        .build()
        .map_err(|e| ScanError::InvalidConfig {
            message: e.to_string(),
        })
}
