//! Errors from the model provider.

/// Failure modes of a model invocation.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum UpstreamErrorKind {
    /// The request exceeded the per-call time limit
    #[display(
        "Upstream request timed out (>{timeout_ms}ms). The model may be slow or overloaded; raise AI_REQUEST_TIMEOUT_MS or reduce the requested output size"
    )]
    Timeout {
        /// Limit that was exceeded
        timeout_ms: u64,
    },
    /// The provider answered with a non-success status
    #[display("OpenAI-compatible error ({status}) - {detail}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Provider diagnostic
        detail: String,
    },
    /// The request never produced a response
    #[display("Upstream transport failure: {}", _0)]
    Transport(String),
    /// The response body could not be decoded
    #[display("Upstream response could not be decoded: {}", _0)]
    Decode(String),
}

/// Upstream error with location tracking.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{UpstreamError, UpstreamErrorKind};
///
/// let err = UpstreamError::new(UpstreamErrorKind::Timeout { timeout_ms: 120_000 });
/// assert!(format!("{}", err).contains("AI_REQUEST_TIMEOUT_MS"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Error: {} at line {} in {}", kind, line, file)]
pub struct UpstreamError {
    /// The specific failure
    pub kind: UpstreamErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl UpstreamError {
    /// Create a new UpstreamError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UpstreamErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &UpstreamErrorKind {
        &self.kind
    }
}
