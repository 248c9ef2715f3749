//! Custom error types for bkup
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use std::path::Path;

use thiserror::Error;

/// The main error type for bkup operations
#[derive(Error, Debug)]
pub enum BkupError {
    /// Environment or configuration problems (no home directory, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// `config.json` exists but does not parse
    #[error("Corrupt configuration: {0}")]
    ConfigCorrupt(String),

    /// File I/O errors, always carrying the operation and path
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid arguments or unsafe requests
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Bounded policy is full and queue mode is off
    #[error(
        "Backup limit reached: all {max_versions} slots are in use. \
         Raise max_versions (bkup config set-max <N>), free space with `bkup clean`, \
         or pass --queue to overwrite the oldest backup"
    )]
    CapacityExceeded { max_versions: u32 },

    /// Queue mode is full but every slot is protected for this operation
    #[error("Cannot make room: all {max_versions} slots are protected for this operation")]
    AllCandidatesProtected { max_versions: u32 },

    /// Subshell or editor could not be launched
    #[error("Shell error: {0}")]
    Shell(String),
}

impl BkupError {
    /// Wrap an I/O error with the failing operation and path
    pub fn io(op: &str, path: &Path, err: std::io::Error) -> Self {
        Self::Io(format!("{} {}: {}", op, path.display(), err))
    }

    /// Create a "not found" error for backup slots
    pub fn slot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup slot",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a capacity refusal of either kind
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            Self::CapacityExceeded { .. } | Self::AllCandidatesProtected { .. }
        )
    }
}

impl From<std::io::Error> for BkupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type alias for bkup operations
pub type BkupResult<T> = Result<T, BkupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BkupError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = BkupError::slot_not_found("x_4");
        assert_eq!(err.to_string(), "Backup slot not found: x_4");
        assert!(err.is_not_found());
        assert!(!err.is_capacity());
    }

    #[test]
    fn test_capacity_error_names_limit_and_remedies() {
        let err = BkupError::CapacityExceeded { max_versions: 2 };
        let msg = err.to_string();
        assert!(msg.contains("all 2 slots"));
        assert!(msg.contains("set-max"));
        assert!(msg.contains("bkup clean"));
        assert!(msg.contains("--queue"));
        assert!(err.is_capacity());
    }

    #[test]
    fn test_io_error_carries_context() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = BkupError::io("remove", Path::new("/tmp/x"), io_err);
        assert_eq!(err.to_string(), "I/O error: remove /tmp/x: denied");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let bkup_err: BkupError = io_err.into();
        assert!(matches!(bkup_err, BkupError::Io(_)));
    }
}
