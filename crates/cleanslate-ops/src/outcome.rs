//! Per-file trash outcomes.

use std::io;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

/// What happened when one file was sent to the trash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(tag = "status", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrashOutcome {
    /// The file is now in the trash.
    Succeeded,
    /// The file or its directory could not be modified.
    PermissionDenied,
    /// The file no longer exists.
    NotFound,
    /// Any other failure.
    Failed { message: String },
}

impl TrashOutcome {
    /// Check if the file was moved.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// Classify an I/O error.
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Failed {
                message: error.to_string(),
            },
        }
    }
}

impl std::fmt::Display for TrashOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "moved to trash"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::NotFound => write!(f, "not found"),
            Self::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(
            TrashOutcome::from_io(&denied),
            TrashOutcome::PermissionDenied
        );

        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(TrashOutcome::from_io(&missing), TrashOutcome::NotFound);

        let other = io::Error::other("device busy");
        assert!(matches!(
            TrashOutcome::from_io(&other),
            TrashOutcome::Failed { message } if message.contains("busy")
        ));
    }

    #[test]
    fn test_labels() {
        assert!(TrashOutcome::Succeeded.is_success());
        assert!(!TrashOutcome::NotFound.is_success());
        assert_eq!(TrashOutcome::PermissionDenied.as_ref(), "permission_denied");
        assert_eq!(TrashOutcome::NotFound.to_string(), "not found");
    }
}
