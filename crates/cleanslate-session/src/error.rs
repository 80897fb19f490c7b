//! Session errors.

use std::path::PathBuf;

use thiserror::Error;

use cleanslate_core::ScanError;
use cleanslate_learn::LearnError;

use crate::session::SessionState;

/// Errors returned by [`Session`](crate::Session) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation is not allowed in the current state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The path is not part of the current results.
    #[error("Not in the current results: {path}")]
    UnknownRecord { path: PathBuf },

    /// Feedback was given for something that is not an existing regular
    /// file.
    #[error("Not a regular file: {path}")]
    NotAFile { path: PathBuf },

    /// The entitlement gate refused the scan.
    #[error("This session is not entitled to scan")]
    NotEntitled,

    /// The scan failed or was cancelled.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The learning store failed.
    #[error(transparent)]
    Learn(#[from] LearnError),
}

impl SessionError {
    /// Check if this error is a cancelled scan.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Scan(ScanError::Cancelled))
    }
}
