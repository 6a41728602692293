//! Tests for system prompt resolution.

use async_trait::async_trait;
use panelsmith_cache::{PromptCache, SystemPrompts};
use panelsmith_error::PanelsmithResult;
use panelsmith_interface::PromptSource;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingSource {
    fetches: AtomicUsize,
    text: Option<String>,
}

#[async_trait]
impl PromptSource for CountingSource {
    async fn fetch(&self, _key: &str) -> PanelsmithResult<Option<String>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

#[tokio::test]
async fn test_cached_prompt_is_not_refetched() {
    let source = Arc::new(CountingSource {
        fetches: AtomicUsize::new(0),
        text: Some("override".to_string()),
    });
    let mut prompts = SystemPrompts::new(source.clone(), PromptCache::default());

    assert_eq!(prompts.load("k", "default").await.unwrap(), "override");
    assert_eq!(prompts.load("k", "default").await.unwrap(), "override");
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    assert!(prompts.invalidate("k"));
    prompts.load("k", "default").await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

    prompts.reset();
    prompts.load("k", "default").await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_blank_override_falls_back_to_default() {
    let source = Arc::new(CountingSource {
        fetches: AtomicUsize::new(0),
        text: Some("   ".to_string()),
    });
    let mut prompts = SystemPrompts::new(source, PromptCache::default());
    assert_eq!(prompts.load("k", "default").await.unwrap(), "default");
}

#[tokio::test]
async fn test_separate_instances_share_nothing() {
    let source = Arc::new(CountingSource {
        fetches: AtomicUsize::new(0),
        text: None,
    });
    let mut first = SystemPrompts::new(source.clone(), PromptCache::default());
    let mut second = SystemPrompts::new(source.clone(), PromptCache::default());

    first.load("k", "a").await.unwrap();
    second.load("k", "b").await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
}
