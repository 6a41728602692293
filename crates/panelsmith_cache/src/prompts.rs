//! System prompt resolution: override source, cache, built-in default.

use crate::PromptCache;
use async_trait::async_trait;
use panelsmith_error::PanelsmithResult;
use panelsmith_interface::PromptSource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A [`PromptSource`] backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MapPromptSource {
    prompts: HashMap<String, String>,
}

impl MapPromptSource {
    /// Empty source; every key falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override.
    pub fn with_prompt(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.insert(key.into(), text.into());
        self
    }
}

#[async_trait]
impl PromptSource for MapPromptSource {
    async fn fetch(&self, key: &str) -> PanelsmithResult<Option<String>> {
        Ok(self.prompts.get(key).cloned())
    }
}

/// Resolves system prompts by key for one caller's lifetime.
///
/// Lookup order: cache, source override, the default passed by the task.
/// Blank overrides count as absent.
///
/// # Example
///
/// ```
/// use panelsmith_cache::{MapPromptSource, PromptCache, SystemPrompts};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let source = MapPromptSource::new().with_prompt("workflow.scene_script.system", "Custom");
/// let mut prompts = SystemPrompts::new(Arc::new(source), PromptCache::default());
///
/// assert_eq!(prompts.load("workflow.scene_script.system", "Default").await.unwrap(), "Custom");
/// assert_eq!(prompts.load("workflow.emotion_arc.system", "Default").await.unwrap(), "Default");
/// # });
/// ```
pub struct SystemPrompts {
    source: Arc<dyn PromptSource>,
    cache: PromptCache,
}

impl SystemPrompts {
    /// Combine a source with a cache.
    pub fn new(source: Arc<dyn PromptSource>, cache: PromptCache) -> Self {
        Self { source, cache }
    }

    /// No overrides: every key resolves to its default.
    pub fn defaults_only() -> Self {
        Self::new(Arc::new(MapPromptSource::new()), PromptCache::default())
    }

    /// Resolve the prompt for `key`.
    ///
    /// # Errors
    ///
    /// Propagates source failures.
    #[instrument(skip(self, default))]
    pub async fn load(&mut self, key: &str, default: &str) -> PanelsmithResult<String> {
        if let Some(entry) = self.cache.get(key) {
            return Ok(entry.value().clone());
        }

        let text = match self.source.fetch(key).await? {
            Some(text) if !text.trim().is_empty() => {
                debug!("Using prompt override");
                text
            }
            _ => default.to_string(),
        };
        self.cache.insert(key, text.clone());
        Ok(text)
    }

    /// Forget a cached prompt so the next load refetches it.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.cache.invalidate(key)
    }

    /// Forget every cached prompt.
    pub fn reset(&mut self) {
        self.cache.reset();
    }
}

impl std::fmt::Debug for SystemPrompts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemPrompts")
            .field("cached", &self.cache.len())
            .finish()
    }
}
