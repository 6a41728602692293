//! Budget and protocol errors of the tool-calling loop.

/// Conditions that stop an agent loop.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum AgentErrorKind {
    /// The model asked for a tool that is not registered
    #[display("Agent unknown tool: {}", _0)]
    UnknownTool(String),
    /// The step budget ran out before a final answer
    #[display("Agent reached max steps ({})", _0)]
    MaxStepsExceeded(u32),
    /// The wall-clock budget ran out
    #[display("Agent timed out after {}ms", _0)]
    Timeout(u64),
    /// A single model call exceeded the step time limit
    #[display("Agent model step {step} timed out after {timeout_ms}ms")]
    StepTimeout {
        /// 1-based step index
        step: u32,
        /// Limit that was exceeded
        timeout_ms: u64,
    },
    /// The reply was JSON but not a tool call or final answer
    #[display("Agent reply is not a valid action: {}", _0)]
    InvalidAction(String),
    /// The final payload did not have the required shape
    #[display("Agent final payload rejected: {}", _0)]
    InvalidFinal(String),
}

/// Agent error with location tracking.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{AgentError, AgentErrorKind};
///
/// let err = AgentError::new(AgentErrorKind::MaxStepsExceeded(6));
/// assert!(format!("{}", err).contains("max steps (6)"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Agent Error: {} at line {} in {}", kind, line, file)]
pub struct AgentError {
    /// The specific condition
    pub kind: AgentErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl AgentError {
    /// Create a new AgentError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AgentErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &AgentErrorKind {
        &self.kind
    }
}
