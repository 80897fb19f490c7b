//! Cross-thread scan cancellation.

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

/// Cancels the scan currently running on a session.
///
/// Clones share state with the session that handed them out. Each scan gets
/// a fresh token, so cancelling when no scan is running has no effect on
/// later scans.
#[derive(Debug, Clone, Default)]
pub struct ScanCanceller {
    current: Arc<Mutex<CancellationToken>>,
}

impl ScanCanceller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the running scan, if any.
    pub fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Check if the current scan was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_cancelled()
    }

    /// Install a fresh token for a new scan and return it.
    pub(crate) fn reset(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_reaches_current_token() {
        let canceller = ScanCanceller::new();
        let token = canceller.reset();
        let remote = canceller.clone();

        remote.cancel();
        assert!(token.is_cancelled());
        assert!(canceller.is_cancelled());
    }

    #[test]
    fn test_reset_clears_stale_cancel() {
        let canceller = ScanCanceller::new();
        canceller.cancel();
        let token = canceller.reset();
        assert!(!token.is_cancelled());
        assert!(!canceller.is_cancelled());
    }
}
