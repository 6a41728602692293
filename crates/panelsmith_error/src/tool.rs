//! Tool execution errors.

/// A registered tool failed while executing.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Tool Error: {} failed: {} at line {} in {}", tool, message, line, file)]
pub struct ToolError {
    /// Name of the tool
    pub tool: String,
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ToolError {
    /// Create a new ToolError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use panelsmith_error::ToolError;
    ///
    /// let err = ToolError::new("read_episode_context", "project not found");
    /// assert_eq!(err.message, "project not found");
    /// ```
    #[track_caller]
    pub fn new(tool: impl Into<String>, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            tool: tool.into(),
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
