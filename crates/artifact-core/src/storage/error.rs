//! Catalog error handling
//!
//! Provides typed errors for catalog operations with descriptive messages
//! and recovery suggestions.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required input was missing or invalid; nothing was written
    #[error("{0}")]
    Validation(String),

    /// The entity does not exist or belongs to another owner
    #[error("Not found")]
    NotFound,

    /// A uniqueness rule was violated (e.g. a duplicate collection slug)
    #[error("{0}")]
    Conflict(String),

    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'. Check file permissions.")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create an error from an I/O error with path context
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StoreError::PermissionDenied {
                path,
                source: error,
            },
            _ => StoreError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    /// Whether the caller can fix this by changing its input
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            StoreError::Validation(_) | StoreError::NotFound | StoreError::Conflict(_)
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StoreError::Conflict(_) => Some("Choose a different name and try again."),
            StoreError::PermissionDenied { .. } => {
                Some("Check file and directory permissions for the data directory.")
            }
            StoreError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            _ => None,
        }
    }
}

/// Whether a database error is a UNIQUE / PRIMARY KEY constraint violation
pub(crate) fn is_unique_violation(error: &rusqlite::Error) -> bool {
    match error {
        rusqlite::Error::SqliteFailure(err, _) => {
            err.code == rusqlite::ErrorCode::ConstraintViolation
                && (err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

/// Result type for catalog operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StoreError::from_io(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StoreError::PermissionDenied { .. }));
        assert!(err.recovery_suggestion().is_some());
        assert!(!err.is_caller_error());
    }

    #[test]
    fn test_other_io_classified_as_create_directory() {
        let io_err = io::Error::new(io::ErrorKind::Other, "boom");
        let err = StoreError::from_io(io_err, PathBuf::from("/data"));
        assert!(matches!(err, StoreError::CreateDirectory { .. }));
    }

    #[test]
    fn test_not_found_message_is_generic() {
        assert_eq!(StoreError::NotFound.to_string(), "Not found");
    }

    #[test]
    fn test_validation_message_verbatim() {
        let err = StoreError::validation("Name is required");
        assert_eq!(err.to_string(), "Name is required");
        assert!(err.is_caller_error());
    }

    #[test]
    fn test_conflict_has_suggestion() {
        let err = StoreError::Conflict("Collection with this name already exists".into());
        assert!(err.is_caller_error());
        assert_eq!(
            err.recovery_suggestion(),
            Some("Choose a different name and try again.")
        );
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));

        let other = conn.execute("INSERT INTO missing VALUES (1)", []).unwrap_err();
        assert!(!is_unique_violation(&other));
    }
}
