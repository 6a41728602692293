//! Errors raised while locating or parsing JSON in model output.

/// Why a JSON value could not be recovered from model output.
///
/// Each variant renders an actionable message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ExtractionErrorKind {
    /// The model returned nothing but whitespace
    #[display(
        "Model returned empty output. The upstream API may have rejected the request, filtered the content, or run out of quota; check the provider console and retry"
    )]
    Empty,
    /// No `{` or `[` anywhere in the output
    #[display(
        "No JSON start found in model output. The model answered in prose instead of JSON; tighten the system prompt or switch to a model that follows format instructions"
    )]
    NoJsonStart,
    /// A JSON value was opened but never closed
    #[display(
        "Model output was truncated: the JSON value is never closed. Raise max output tokens (8000 or more) in the model profile, or request fewer items per call"
    )]
    Unterminated,
    /// A closing bracket does not match the open one
    #[display(
        "Model output has mismatched brackets. The JSON structure is malformed; retry, or simplify the requested structure"
    )]
    Mismatched,
    /// The value is the wrong JSON type
    #[display("JSON type mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// Expected kind (`object` or `array`)
        expected: &'static str,
        /// Kind found in the output
        actual: &'static str,
    },
    /// The candidate span was found but does not parse even after repair
    #[display(
        "Failed to parse model JSON: {}{}",
        message,
        context.as_ref().map(|c| format!("\n{}", c)).unwrap_or_default()
    )]
    Parse {
        /// Parser diagnostic
        message: String,
        /// Snippet of the text around the failure position, with a caret
        context: Option<String>,
    },
}

/// Extraction error with location tracking.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{ExtractionError, ExtractionErrorKind};
///
/// let err = ExtractionError::new(ExtractionErrorKind::Unterminated);
/// assert!(format!("{}", err).contains("truncated"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Extraction Error: {} at line {} in {}", kind, line, file)]
pub struct ExtractionError {
    /// The specific failure
    pub kind: ExtractionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl ExtractionError {
    /// Create a new ExtractionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExtractionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ExtractionErrorKind {
        &self.kind
    }
}
