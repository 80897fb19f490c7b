//! Routing delete and keep decisions to the trash and the learning store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use cleanslate_core::{Action, ExtStat, normalize_extension};
use cleanslate_learn::{LearnError, LearningStore};
use cleanslate_ops::{Trash, TrashOutcome};

use crate::error::SessionError;

/// Result of sending one file to the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashReport {
    pub path: PathBuf,
    pub outcome: TrashOutcome,
    /// Updated stats for the file's extension once the `delete` is recorded.
    pub learned: Option<ExtStat>,
    /// Set when the file was trashed but the `delete` action could not be
    /// recorded.
    pub feedback_error: Option<String>,
}

impl TrashReport {
    /// Check if the file was trashed and the action learned.
    pub fn is_complete(&self) -> bool {
        self.outcome.is_success() && self.feedback_error.is_none()
    }
}

/// Trash each path and learn a `delete` for every one that was moved.
///
/// Every path is attempted, whatever happened to the previous ones.
pub fn trash_and_learn(
    trash: &dyn Trash,
    store: &LearningStore,
    paths: &[PathBuf],
) -> Vec<TrashReport> {
    cleanslate_ops::trash_batch(trash, paths)
        .into_iter()
        .map(|(path, outcome)| {
            let (learned, feedback_error) = if outcome.is_success() {
                match learn(store, &path, Action::Delete) {
                    Ok(stat) => (Some(stat), None),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "Trashed but not learned");
                        (None, Some(err.to_string()))
                    }
                }
            } else {
                (None, None)
            };
            TrashReport {
                path,
                outcome,
                learned,
                feedback_error,
            }
        })
        .collect()
}

/// Learn a `keep` for an existing regular file.
pub fn keep_and_learn(store: &LearningStore, path: &Path) -> Result<ExtStat, SessionError> {
    let is_file = std::fs::symlink_metadata(path).is_ok_and(|meta| meta.is_file());
    if !is_file {
        return Err(SessionError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(learn(store, path, Action::Keep)?)
}

fn learn(store: &LearningStore, path: &Path, action: Action) -> Result<ExtStat, LearnError> {
    store.record_action(&normalize_extension(path), action)
}
