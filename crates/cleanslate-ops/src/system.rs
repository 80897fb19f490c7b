//! Trash adapters.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::outcome::TrashOutcome;

/// Moves files to a trash or recycle bin.
pub trait Trash: Send + Sync {
    /// Move one regular file to the trash. Never deletes irreversibly.
    fn move_to_trash(&self, path: &Path) -> TrashOutcome;
}

/// The platform trash (freedesktop trash, macOS Trash, Windows Recycle Bin).
///
/// Only regular files are accepted; directories and symlinks fail without
/// being touched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl SystemTrash {
    pub fn new() -> Self {
        Self
    }
}

impl Trash for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> TrashOutcome {
        match std::fs::symlink_metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                debug!(path = %path.display(), "Refusing to trash a non-file");
                return TrashOutcome::Failed {
                    message: "not a regular file".to_string(),
                };
            }
            Err(err) => return TrashOutcome::from_io(&err),
        }

        match ::trash::delete(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Moved to trash");
                TrashOutcome::Succeeded
            }
            Err(err) => {
                let outcome = classify(path, &err);
                warn!(path = %path.display(), error = %err, %outcome, "Trash failed");
                outcome
            }
        }
    }
}

fn classify(path: &Path, err: &::trash::Error) -> TrashOutcome {
    // Only the freedesktop backend reports raw I/O errors.
    #[cfg(all(
        unix,
        not(target_os = "macos"),
        not(target_os = "ios"),
        not(target_os = "android")
    ))]
    {
        if let ::trash::Error::FileSystem { source, .. } = err {
            return TrashOutcome::from_io(source);
        }
    }
    match std::fs::symlink_metadata(path) {
        Err(io) if io.kind() == std::io::ErrorKind::NotFound => TrashOutcome::NotFound,
        _ => TrashOutcome::Failed {
            message: err.to_string(),
        },
    }
}

/// Send every path to the trash, in order, and report each outcome.
pub fn trash_batch(trash: &dyn Trash, paths: &[PathBuf]) -> Vec<(PathBuf, TrashOutcome)> {
    paths
        .iter()
        .map(|path| (path.clone(), trash.move_to_trash(path)))
        .collect()
}
