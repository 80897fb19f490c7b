//! Learned preference types shared by the store and the scoring engine.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::config::MAX_BIAS;

/// User feedback on a file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    /// The file was moved to the trash.
    Delete,
    /// The user chose to keep the file.
    Keep,
}

/// One entry of the append-only feedback log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Normalized extension of the file the action applied to.
    pub extension: CompactString,
    /// What the user did.
    pub action: Action,
    /// When the action was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Aggregated learning state for one extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtStat {
    pub extension: CompactString,
    pub delete_count: u64,
    pub keep_count: u64,
    /// Always `bias_for(delete_count, keep_count)`.
    pub bias: i64,
}

impl ExtStat {
    /// Empty stat for an extension with no recorded actions.
    pub fn new(extension: impl Into<CompactString>) -> Self {
        Self {
            extension: extension.into(),
            delete_count: 0,
            keep_count: 0,
            bias: 0,
        }
    }

    /// Count one more action and recompute the bias.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::Delete => self.delete_count += 1,
            Action::Keep => self.keep_count += 1,
        }
        self.bias = bias_for(self.delete_count, self.keep_count);
    }

    /// Total number of recorded actions.
    pub fn total(&self) -> u64 {
        self.delete_count + self.keep_count
    }
}

/// Bias for an extension given its delete and keep counts.
///
/// `round(10 * (d - k) / (d + k))`, halves rounded away from zero, in integer
/// arithmetic. Zero when there are no actions.
pub fn bias_for(delete_count: u64, keep_count: u64) -> i64 {
    let den = i128::from(delete_count) + i128::from(keep_count);
    if den == 0 {
        return 0;
    }
    let num = i128::from(MAX_BIAS) * (i128::from(delete_count) - i128::from(keep_count));
    let rounded = (2 * num + num.signum() * den) / (2 * den);
    // |num| <= 10 * den, so the result always fits.
    rounded.clamp(-i128::from(MAX_BIAS), i128::from(MAX_BIAS)) as i64
}
