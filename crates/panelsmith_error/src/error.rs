//! Top-level error wrapper types.

#[cfg(feature = "database")]
use crate::DatabaseError;
use crate::{
    AgentError, ConfigError, ExtractionError, JsonError, StorageError, ToolError,
    UpstreamError, ValidationError,
};

/// Every error the reliability layer can raise.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{PanelsmithError, ConfigError};
///
/// let err: PanelsmithError = ConfigError::new("missing api key").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum PanelsmithErrorKind {
    /// No JSON value could be recovered from model output
    #[from(ExtractionError)]
    Extraction(ExtractionError),
    /// A candidate value violated its structural contract
    #[from(ValidationError)]
    Validation(ValidationError),
    /// The model provider failed or timed out
    #[from(UpstreamError)]
    Upstream(UpstreamError),
    /// The agent loop stopped without a final answer
    #[from(AgentError)]
    Agent(AgentError),
    /// A tool failed while executing
    #[from(ToolError)]
    Tool(ToolError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Persistence collaborator error
    #[from(StorageError)]
    Storage(StorageError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
}

/// Panelsmith error with kind discrimination.
///
/// # Examples
///
/// ```
/// use panelsmith_error::{PanelsmithResult, ValidationError};
///
/// fn validate() -> PanelsmithResult<()> {
///     Err(ValidationError::new("episode_plan_batch", vec!["episodes: expected 10 items".into()]))?
/// }
///
/// let err = validate().unwrap_err();
/// assert!(err.is_fixable());
/// assert!(!err.is_upstream());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Panelsmith Error: {}", _0)]
pub struct PanelsmithError(Box<PanelsmithErrorKind>);

impl PanelsmithError {
    /// Create a new error from a kind.
    pub fn new(kind: PanelsmithErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PanelsmithErrorKind {
        &self.0
    }

    /// Whether a fix prompt can recover from this error.
    pub fn is_fixable(&self) -> bool {
        matches!(
            self.kind(),
            PanelsmithErrorKind::Extraction(_) | PanelsmithErrorKind::Validation(_)
        )
    }

    /// Whether the model provider raised this error.
    pub fn is_upstream(&self) -> bool {
        matches!(self.kind(), PanelsmithErrorKind::Upstream(_))
    }
}

// Generic From implementation for any type that converts to PanelsmithErrorKind
impl<T> From<T> for PanelsmithError
where
    T: Into<PanelsmithErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for panelsmith operations.
pub type PanelsmithResult<T> = std::result::Result<T, PanelsmithError>;
