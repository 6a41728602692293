//! Structural contract violations.

/// A candidate value failed its named structural contract.
///
/// # Examples
///
/// ```
/// use panelsmith_error::ValidationError;
///
/// let err = ValidationError::new("sound_design", vec!["cues: must not be empty".to_string()]);
/// assert!(format!("{}", err).contains("cues: must not be empty"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "Validation Error: output does not satisfy contract '{}': {} at line {} in {}",
    contract,
    issues.join("; "),
    line,
    file
)]
pub struct ValidationError {
    /// Name of the contract that rejected the value
    pub contract: String,
    /// One entry per violation, formatted as `path: message`
    pub issues: Vec<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ValidationError {
    /// Create a new ValidationError with automatic location tracking.
    #[track_caller]
    pub fn new(contract: impl Into<String>, issues: Vec<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            contract: contract.into(),
            issues,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Issues joined for inclusion in a prompt.
    pub fn summary(&self) -> String {
        self.issues.join("; ")
    }
}
