//! Configuration errors.

use std::fmt;

/// Configuration could not be loaded or is incomplete.
///
/// When a single setting or environment variable is at fault, `key` names
/// it so the operator knows what to set.
///
/// # Examples
///
/// ```
/// use panelsmith_error::ConfigError;
///
/// let err = ConfigError::for_key("DEEPSEEK_API_KEY", "not set");
/// assert_eq!(err.key.as_deref(), Some("DEEPSEEK_API_KEY"));
/// assert!(err.to_string().contains("DEEPSEEK_API_KEY: not set"));
/// ```
#[derive(Debug, Clone, derive_more::Error)]
pub struct ConfigError {
    /// Offending setting or variable, when known
    pub key: Option<String>,
    /// What is wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Error not tied to one setting.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::located(None, message.into())
    }

    /// Error about the setting or variable `key`.
    #[track_caller]
    pub fn for_key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::located(Some(key.into()), message.into())
    }

    #[track_caller]
    fn located(key: Option<String>, message: String) -> Self {
        let location = std::panic::Location::caller();
        Self {
            key,
            message,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "Configuration Error: {}: {}", key, self.message)?,
            None => write!(f, "Configuration Error: {}", self.message)?,
        }
        write!(f, " at line {} in {}", self.line, self.file)
    }
}
