//! Suggestion scoring.
//!
//! A score is the plain sum of three bounded integer terms:
//! - size, 0..=10, saturating at the large-file threshold
//! - age, 0..=10, saturating at the old-file threshold
//! - the learned bias of the file's extension, -10..=10
//!
//! Duplicate membership is not part of the score.

use std::time::{Duration, SystemTime};

use cleanslate_core::{EngineConfig, FileRecord, MAX_BIAS, MAX_TERM, ScoreTerms};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Scores records against fixed thresholds and a fixed reference time.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: EngineConfig,
    reference_time: SystemTime,
}

impl ScoringEngine {
    /// Create an engine measuring ages against `reference_time`.
    pub fn new(config: EngineConfig, reference_time: SystemTime) -> Self {
        Self {
            config,
            reference_time,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reference_time(&self) -> SystemTime {
        self.reference_time
    }

    /// `floor(10 * size / large_file_threshold)`, capped at 10, and 0 below
    /// the minimum scored size.
    pub fn size_term(&self, size: u64) -> i64 {
        if size < self.config.min_scored_size {
            return 0;
        }
        proportional_term(size, self.config.large_file_threshold)
    }

    /// `floor(10 * age_days / old_file_days)`, capped at 10. Modification
    /// times after the reference time count as age 0.
    pub fn age_term(&self, modified: SystemTime) -> i64 {
        let days = self
            .reference_time
            .duration_since(modified)
            .unwrap_or(Duration::ZERO)
            .as_secs()
            / SECS_PER_DAY;
        proportional_term(days, self.config.old_file_days)
    }

    /// All three terms for a record given its extension's bias.
    pub fn terms(&self, record: &FileRecord, bias: i64) -> ScoreTerms {
        ScoreTerms {
            size: self.size_term(record.size_bytes),
            age: self.age_term(record.modified_at),
            bias: bias.clamp(-MAX_BIAS, MAX_BIAS),
        }
    }

    /// Score of a record given its extension's bias.
    pub fn score(&self, record: &FileRecord, bias: i64) -> i64 {
        self.terms(record, bias).total()
    }

    /// Recompute a record's terms and score in place.
    pub fn apply(&self, record: &mut FileRecord, bias: i64) {
        record.set_terms(self.terms(record, bias));
    }

    /// Score every record, looking biases up by extension.
    pub fn score_all<F>(&self, records: &mut [FileRecord], mut bias_for: F)
    where
        F: FnMut(&str) -> i64,
    {
        for record in records {
            let bias = bias_for(record.extension.as_str());
            self.apply(record, bias);
        }
    }
}

/// `floor(MAX_TERM * value / threshold)`, capped at `MAX_TERM`.
fn proportional_term(value: u64, threshold: u64) -> i64 {
    if threshold == 0 || value >= threshold {
        return MAX_TERM;
    }
    // value < threshold, so the quotient is below MAX_TERM.
    ((u128::from(value) * MAX_TERM as u128) / u128::from(threshold)) as i64
}

/// Format a duration as a human-readable string.
pub fn format_age(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs} seconds")
    } else if secs < 3600 {
        format!("{} minutes", secs / 60)
    } else if secs < SECS_PER_DAY {
        format!("{} hours", secs / 3600)
    } else if secs < 30 * SECS_PER_DAY {
        format!("{} days", secs / SECS_PER_DAY)
    } else if secs < 365 * SECS_PER_DAY {
        format!("{} months", secs / (30 * SECS_PER_DAY))
    } else {
        format!("{:.1} years", secs as f64 / (365 * SECS_PER_DAY) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn engine(now: SystemTime) -> ScoringEngine {
        ScoringEngine::new(EngineConfig::default(), now)
    }

    fn days_ago(now: SystemTime, days: u64) -> SystemTime {
        now - Duration::from_secs(days * SECS_PER_DAY)
    }

    #[test]
    fn test_size_term() {
        let engine = engine(SystemTime::now());
        assert_eq!(engine.size_term(0), 0);
        assert_eq!(engine.size_term(64 * 1024 - 1), 0);
        assert_eq!(engine.size_term(5 * MIB), 1);
        assert_eq!(engine.size_term(25 * MIB), 5);
        assert_eq!(engine.size_term(50 * MIB - 1), 9);
        assert_eq!(engine.size_term(50 * MIB), 10);
        assert_eq!(engine.size_term(u64::MAX), 10);
    }

    #[test]
    fn test_age_term() {
        let now = SystemTime::now();
        let engine = engine(now);
        assert_eq!(engine.age_term(now), 0);
        assert_eq!(engine.age_term(days_ago(now, 17)), 0);
        assert_eq!(engine.age_term(days_ago(now, 18)), 1);
        assert_eq!(engine.age_term(days_ago(now, 90)), 5);
        assert_eq!(engine.age_term(days_ago(now, 179)), 9);
        assert_eq!(engine.age_term(days_ago(now, 180)), 10);
        assert_eq!(engine.age_term(days_ago(now, 5000)), 10);
        assert_eq!(engine.age_term(now + Duration::from_secs(86400)), 0);
    }

    #[test]
    fn test_bias_is_clamped() {
        let now = SystemTime::now();
        let record = FileRecord::new("/a.tmp", 0, now);
        assert_eq!(engine(now).score(&record, 25), 10);
        assert_eq!(engine(now).score(&record, -25), -10);
    }

    #[test]
    fn test_score_all_uses_extension_bias() {
        let now = SystemTime::now();
        let mut records = vec![
            FileRecord::new("/x/a.TMP", 0, now),
            FileRecord::new("/x/b.keep", 0, now),
        ];
        engine(now).score_all(&mut records, |ext| match ext {
            ".tmp" => 10,
            ".keep" => -10,
            _ => 0,
        });
        assert_eq!(records[0].score, 10);
        assert_eq!(records[1].score, -10);
        assert_eq!(records[1].terms.bias, -10);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(30)), "30 seconds");
        assert_eq!(format_age(Duration::from_secs(120)), "2 minutes");
        assert_eq!(format_age(Duration::from_secs(7200)), "2 hours");
        assert_eq!(format_age(Duration::from_secs(172800)), "2 days");
    }
}
