//! Serialization failures for artifacts, outlines and migrated prompts.

use std::fmt;

/// A value could not be converted to or from JSON.
///
/// `subject` names the value, so a failure in a batch run points at the
/// artifact or scene that caused it.
///
/// # Examples
///
/// ```
/// use panelsmith_error::JsonError;
///
/// let err = JsonError::new("scene s1", "invalid type: null, expected a string");
/// assert_eq!(err.subject, "scene s1");
/// assert!(err.to_string().starts_with("JSON Error (scene s1): invalid type"));
/// ```
#[derive(Debug, Clone, derive_more::Error)]
pub struct JsonError {
    /// What was being encoded or decoded
    pub subject: String,
    /// Message from serde
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl JsonError {
    /// Record a failure converting `subject`.
    #[track_caller]
    pub fn new(subject: impl Into<String>, source: impl fmt::Display) -> Self {
        let location = std::panic::Location::caller();
        Self {
            subject: subject.into(),
            message: source.to_string(),
            line: location.line(),
            file: location.file(),
        }
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON Error ({}): {} at line {} in {}",
            self.subject, self.message, self.line, self.file
        )
    }
}
