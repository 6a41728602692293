//! Legacy path run when the loop cannot produce an answer.

use async_trait::async_trait;
use panelsmith_error::{PanelsmithError, PanelsmithResult};

/// Result of the legacy path.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome<F> {
    /// Answer produced without the agent
    pub final_value: F,
    /// Reason recorded in the trace; defaults to the loop's failure message
    pub reason: Option<String>,
}

impl<F> FallbackOutcome<F> {
    /// Outcome with an explicit reason.
    pub fn new(final_value: F, reason: impl Into<String>) -> Self {
        Self {
            final_value,
            reason: Some(reason.into()),
        }
    }
}

/// Produces the answer the pre-agent way.
#[async_trait]
pub trait LegacyFallback<F>: Send + Sync {
    /// Run the legacy path after the loop failed with `cause`.
    async fn run(&self, cause: &PanelsmithError) -> PanelsmithResult<FallbackOutcome<F>>;
}
