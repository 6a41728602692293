//! Persistence collaborator errors.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StorageErrorKind {
    /// The addressed record does not exist
    #[display("Record not found: {}", _0)]
    NotFound(String),
    /// A transaction was rolled back
    #[display("Transaction failed: {}", _0)]
    Transaction(String),
    /// The backend could not be reached
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("scene s1".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
