//! System prompt caching for panelsmith.
//!
//! The cache is an explicit value owned by whoever runs tasks. Nothing here is
//! process-global: drop it, [`PromptCache::invalidate`] one key, or
//! [`PromptCache::reset`] everything.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod prompts;

pub use cache::{CacheEntry, PromptCache, PromptCacheConfig, PromptCacheConfigBuilder};
pub use prompts::{MapPromptSource, SystemPrompts};
