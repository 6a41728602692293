//! System prompt lookup.

use async_trait::async_trait;
use panelsmith_error::PanelsmithResult;

/// Where system prompt overrides live (database, files, config).
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// The override for `key`, or `None` to use the built-in default.
    async fn fetch(&self, key: &str) -> PanelsmithResult<Option<String>>;
}
