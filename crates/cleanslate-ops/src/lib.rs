//! Trash integration for cleanslate.
//!
//! Files are never unlinked directly: they are handed to a [`Trash`]
//! implementation, by default the platform trash via the `trash` crate. Every
//! file gets its own [`TrashOutcome`], and a failure on one file never stops
//! a batch.

mod outcome;
mod system;

pub use outcome::TrashOutcome;
pub use system::{SystemTrash, Trash, trash_batch};
