//! Scan-score-learn session orchestration for cleanslate.
//!
//! A [`Session`] drives one scan at a time through
//! `Idle -> Scanning -> Ready -> Idle`:
//!
//! 1. walk the root and collect file records
//! 2. fingerprint and group duplicates
//! 3. score every record with the learned extension biases
//! 4. hand out the ranked records, accept feedback and trash requests
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cleanslate_core::{EngineConfig, ResultFilter};
//! use cleanslate_learn::LearningStore;
//! use cleanslate_session::Session;
//!
//! let store = Arc::new(LearningStore::open_in_memory().unwrap());
//! let mut session = Session::new(store, EngineConfig::default());
//! let report = session.scan("/home/user/Downloads").unwrap();
//! println!("{} files, {} failures", report.files, report.failures.count);
//!
//! for record in session.filter(&ResultFilter::new().with_only_duplicates(true)).unwrap() {
//!     println!("{:>4} {}", record.score, record.path.display());
//! }
//! ```

mod cancel;
mod entitlement;
mod error;
mod feedback;
mod session;

pub use cancel::ScanCanceller;
pub use entitlement::{AlwaysEntitled, Entitlement};
pub use error::SessionError;
pub use feedback::{TrashReport, keep_and_learn, trash_and_learn};
pub use session::{ScanReport, Session, SessionState};
