//! Persistent per-extension learning store for cleanslate.
//!
//! Every delete/keep decision is appended to an action log, and the
//! per-extension counters and bias derived from it are updated in the same
//! SQLite transaction. The scoring engine reads the biases back.
//!
//! ```rust,no_run
//! use cleanslate_core::Action;
//! use cleanslate_learn::LearningStore;
//!
//! let store = LearningStore::open(LearningStore::default_path().unwrap()).unwrap();
//! let stat = store.record_action(".tmp", Action::Delete).unwrap();
//! assert_eq!(store.get_bias(".tmp").unwrap(), stat.bias);
//! ```

mod error;
mod store;

pub use error::LearnError;
pub use store::{LearningStore, SCHEMA_VERSION};

pub use cleanslate_core::{Action, ActionRecord, ExtStat, bias_for};
