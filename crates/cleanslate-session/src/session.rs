//! The session state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cleanslate_analyze::{DuplicateGrouper, GroupingSummary, ScoringEngine, assign_group_sizes};
use cleanslate_core::{
    Action, EngineConfig, ExtStat, FailureSummary, FileRecord, ResultFilter, ScanConfig,
};
use cleanslate_learn::LearningStore;
use cleanslate_ops::{SystemTrash, Trash};
use cleanslate_scan::{ScanProgress, Walker};

use crate::cancel::ScanCanceller;
use crate::entitlement::{AlwaysEntitled, Entitlement};
use crate::error::SessionError;
use crate::feedback::{TrashReport, trash_and_learn};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    /// No results; a scan may start.
    #[default]
    Idle,
    /// A scan is running.
    Scanning,
    /// Ranked results are available.
    Ready,
}

/// Summary of a completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Canonical root that was scanned.
    pub root: PathBuf,
    /// Number of records produced.
    pub files: usize,
    /// Entries skipped by the walker.
    pub failures: FailureSummary,
    /// Duplicate grouping counters.
    pub grouping: GroupingSummary,
    /// Time ages were measured against.
    pub reference_time: SystemTime,
    /// Wall time of the whole scan.
    pub duration: Duration,
}

/// Results of the last scan.
struct Results {
    records: Vec<FileRecord>,
    scoring: ScoringEngine,
}

/// Coordinates scanning, scoring, feedback and trashing.
pub struct Session {
    store: Arc<LearningStore>,
    trash: Box<dyn Trash>,
    entitlement: Box<dyn Entitlement>,
    scan_options: ScanConfig,
    engine: EngineConfig,
    walker: Walker,
    canceller: ScanCanceller,
    state: SessionState,
    results: Option<Results>,
}

impl Session {
    /// Create an idle session using the platform trash.
    pub fn new(store: Arc<LearningStore>, engine: EngineConfig) -> Self {
        Self {
            store,
            trash: Box::new(SystemTrash::new()),
            entitlement: Box::new(AlwaysEntitled),
            scan_options: ScanConfig::default(),
            engine,
            walker: Walker::new(),
            canceller: ScanCanceller::new(),
            state: SessionState::Idle,
            results: None,
        }
    }

    /// Use another trash implementation.
    pub fn with_trash(mut self, trash: impl Trash + 'static) -> Self {
        self.trash = Box::new(trash);
        self
    }

    /// Gate scans behind an entitlement check.
    pub fn with_entitlement(mut self, entitlement: impl Entitlement + 'static) -> Self {
        self.entitlement = Box::new(entitlement);
        self
    }

    /// Walker options; the root is replaced by each scan's root.
    pub fn with_scan_options(mut self, options: ScanConfig) -> Self {
        self.scan_options = options;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    pub fn store(&self) -> &Arc<LearningStore> {
        &self.store
    }

    /// Handle that cancels the running scan from another thread.
    pub fn canceller(&self) -> ScanCanceller {
        self.canceller.clone()
    }

    /// Subscribe to walk progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.walker.subscribe()
    }

    /// Scan `root` and rank its files.
    ///
    /// Any previous results are discarded first. On error or cancellation
    /// the session is left `Idle` with no results.
    pub fn scan(&mut self, root: impl AsRef<Path>) -> Result<ScanReport, SessionError> {
        // Any cancel from here on reaches this scan.
        let cancel = self.canceller.reset();
        self.close();

        if !self.entitlement.is_entitled() {
            info!("Scan refused by entitlement gate");
            return Err(SessionError::NotEntitled);
        }

        self.state = SessionState::Scanning;
        match self.run_scan(root.as_ref(), &cancel) {
            Ok((report, results)) => {
                self.results = Some(results);
                self.state = SessionState::Ready;
                Ok(report)
            }
            Err(err) => {
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }

    fn run_scan(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<(ScanReport, Results), SessionError> {
        let reference_time = SystemTime::now();

        let mut options = self.scan_options.clone();
        options.root = root.to_path_buf();

        let walked = self.walker.scan(&options, cancel)?;
        let mut records = walked.records;

        let grouping = DuplicateGrouper::new(self.engine.clone())
            .assign(&mut records, cancel)?;

        let biases = self.store.biases()?;
        let scoring = ScoringEngine::new(self.engine.clone(), reference_time);
        scoring.score_all(&mut records, |ext| biases.get(ext).copied().unwrap_or(0));
        rank(&mut records);

        info!(
            root = %walked.root.display(),
            files = records.len(),
            failures = walked.failures.count,
            duplicates = grouping.duplicate_files,
            "Scan ready"
        );

        let report = ScanReport {
            root: walked.root,
            files: records.len(),
            failures: walked.failures,
            grouping,
            reference_time,
            duration: reference_time.elapsed().unwrap_or_default(),
        };
        Ok((report, Results { records, scoring }))
    }

    /// Ranked records: score descending, then path ascending.
    pub fn records(&self) -> Result<&[FileRecord], SessionError> {
        Ok(&self.ready("read results")?.records)
    }

    /// Ranked records passing `filter`.
    pub fn filter(&self, filter: &ResultFilter) -> Result<Vec<&FileRecord>, SessionError> {
        let results = self.ready("filter results")?;
        Ok(filter.apply(
            &results.records,
            results.scoring.config(),
            results.scoring.reference_time(),
        ))
    }

    /// Learn from a decision on one record and rescore its extension.
    pub fn record_feedback(
        &mut self,
        path: impl AsRef<Path>,
        action: Action,
    ) -> Result<ExtStat, SessionError> {
        let path = path.as_ref();
        let results = self.ready("record feedback")?;
        let extension = results
            .records
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.extension.clone())
            .ok_or_else(|| SessionError::UnknownRecord {
                path: path.to_path_buf(),
            })?;

        let stat = self.store.record_action(&extension, action)?;
        if let Some(results) = self.results.as_mut() {
            results.rescore_extension(&stat);
            rank(&mut results.records);
        }
        Ok(stat)
    }

    /// Move records to the trash and learn a `delete` for each one moved.
    ///
    /// Every path must be in the current results; otherwise nothing is
    /// trashed. Each file gets its own report and a failure never stops the
    /// batch. Moved files leave the results and every extension that learned
    /// a `delete` is rescored from the updated stats.
    pub fn trash(&mut self, paths: &[PathBuf]) -> Result<Vec<TrashReport>, SessionError> {
        let results = self.ready("trash files")?;
        if let Some(unknown) = paths
            .iter()
            .find(|p| !results.records.iter().any(|r| &r.path == *p))
        {
            return Err(SessionError::UnknownRecord {
                path: unknown.clone(),
            });
        }

        let reports = trash_and_learn(self.trash.as_ref(), &self.store, paths);

        if let Some(results) = self.results.as_mut() {
            let moved: Vec<&PathBuf> = reports
                .iter()
                .filter(|r| r.outcome.is_success())
                .map(|r| &r.path)
                .collect();
            results.records.retain(|r| !moved.contains(&&r.path));
            assign_group_sizes(&mut results.records);

            // Reports are in order, so the last stat per extension is current.
            for stat in reports.iter().filter_map(|r| r.learned.as_ref()) {
                results.rescore_extension(stat);
            }
            rank(&mut results.records);
        }
        Ok(reports)
    }

    /// Erase all learned data and rescore any current results.
    pub fn reset_learning_data(&mut self) -> Result<(), SessionError> {
        self.store.reset()?;
        if let Some(results) = self.results.as_mut() {
            results.scoring.score_all(&mut results.records, |_| 0);
            rank(&mut results.records);
        }
        Ok(())
    }

    /// Drop the results and return to `Idle`.
    pub fn close(&mut self) {
        self.results = None;
        self.state = SessionState::Idle;
    }

    fn ready(&self, operation: &'static str) -> Result<&Results, SessionError> {
        match (&self.results, self.state) {
            (Some(results), SessionState::Ready) => Ok(results),
            (_, state) => Err(SessionError::InvalidState { operation, state }),
        }
    }
}

impl Results {
    fn rescore_extension(&mut self, stat: &ExtStat) {
        for record in self
            .records
            .iter_mut()
            .filter(|r| r.extension == stat.extension)
        {
            self.scoring.apply(record, stat.bias);
        }
    }
}

fn rank(records: &mut [FileRecord]) {
    records.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            Arc::new(LearningStore::open_in_memory().unwrap()),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(
            session.records(),
            Err(SessionError::InvalidState {
                state: SessionState::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_rank_orders_by_score_then_path() {
        let now = SystemTime::now();
        let mut records: Vec<FileRecord> = [("/b", 5), ("/a", 5), ("/c", 9)]
            .iter()
            .map(|(p, score)| {
                let mut r = FileRecord::new(*p, 0, now);
                r.score = *score;
                r
            })
            .collect();
        rank(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.path.to_str().unwrap()).collect();
        assert_eq!(order, vec!["/c", "/a", "/b"]);
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!(
            SessionError::InvalidState {
                operation: "trash files",
                state: SessionState::Idle
            }
            .to_string(),
            "Cannot trash files while idle"
        );
    }
}
