//! Learning store errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the learning store.
#[derive(Debug, Error)]
pub enum LearnError {
    /// SQLite reported an error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("Cannot create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored row does not hold a valid value.
    #[error("Corrupt {table} row: {message}")]
    CorruptRow {
        table: &'static str,
        message: String,
    },

    /// The file was written by a newer schema.
    #[error("Unsupported schema version {found} (expected at most {supported})")]
    UnsupportedSchema { found: i64, supported: i64 },

    /// No platform data directory to hold the default database.
    #[error("Cannot determine the platform data directory")]
    NoDataDir,

    /// A thread panicked while holding the connection.
    #[error("Learning store lock poisoned")]
    Poisoned,
}

impl LearnError {
    pub(crate) fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            table,
            message: message.into(),
        }
    }
}
