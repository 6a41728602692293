//! TTL + LRU cache of prompt texts.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cache entry with value and expiration.
#[derive(Debug, Clone, Getters)]
pub struct CacheEntry {
    value: String,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    /// Check if this entry is expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.ttl.checked_sub(self.created_at.elapsed())
    }
}

/// Configuration for the prompt cache.
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct PromptCacheConfig {
    /// TTL for cached entries (seconds)
    #[serde(default = "default_ttl")]
    #[builder(default = "default_ttl()")]
    ttl_secs: u64,

    /// Maximum cache size (number of entries)
    #[serde(default = "default_max_size")]
    #[builder(default = "default_max_size()")]
    max_size: usize,

    /// Whether caching is enabled
    #[serde(default = "default_enabled")]
    #[builder(default = "default_enabled()")]
    enabled: bool,
}

fn default_ttl() -> u64 {
    300
}

fn default_max_size() -> usize {
    256
}

fn default_enabled() -> bool {
    true
}

impl Default for PromptCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            max_size: default_max_size(),
            enabled: default_enabled(),
        }
    }
}

/// Prompt texts keyed by prompt key, with TTL expiry and LRU eviction.
///
/// # Example
///
/// ```
/// use panelsmith_cache::{PromptCache, PromptCacheConfig};
///
/// let mut cache = PromptCache::new(PromptCacheConfig::default());
/// cache.insert("workflow.sound_design.system", "You are a sound designer.");
/// assert_eq!(
///     cache.get("workflow.sound_design.system").map(|e| e.value().as_str()),
///     Some("You are a sound designer.")
/// );
///
/// cache.invalidate("workflow.sound_design.system");
/// assert!(cache.is_empty());
/// ```
#[derive(Debug)]
pub struct PromptCache {
    config: PromptCacheConfig,
    entries: HashMap<String, CacheEntry>,
    access_order: Vec<String>,
}

impl PromptCache {
    /// Create a new prompt cache with configuration.
    pub fn new(config: PromptCacheConfig) -> Self {
        tracing::debug!(
            ttl_secs = config.ttl_secs,
            max_size = config.max_size,
            enabled = config.enabled,
            "Creating new PromptCache"
        );
        Self {
            config,
            entries: HashMap::new(),
            access_order: Vec::new(),
        }
    }

    /// Cache a prompt text under `key`.
    #[tracing::instrument(skip(self, value), fields(cache_size = self.entries.len()))]
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        if !self.config.enabled {
            tracing::debug!("Cache disabled, skipping insert");
            return;
        }

        if self.entries.len() >= self.config.max_size && !self.entries.contains_key(key) {
            self.evict_lru();
        }

        self.touch(key);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.into(),
                created_at: Instant::now(),
                ttl: Duration::from_secs(self.config.ttl_secs),
            },
        );
    }

    /// Get a live entry.
    ///
    /// Returns None if the entry is missing or expired, or the cache is disabled.
    #[tracing::instrument(skip(self), fields(cache_size = self.entries.len()))]
    pub fn get(&mut self, key: &str) -> Option<&CacheEntry> {
        if !self.config.enabled {
            return None;
        }

        if self.entries.get(key)?.is_expired() {
            tracing::debug!("Cache entry expired, removing");
            self.invalidate(key);
            return None;
        }

        self.touch(key);
        let entry = self.entries.get(key)?;
        tracing::debug!(time_remaining = ?entry.time_remaining(), "Cache hit");
        Some(entry)
    }

    /// Drop one key. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.entries.remove(key).is_some()
    }

    /// Drop every entry.
    pub fn reset(&mut self) {
        let count = self.entries.len();
        self.entries.clear();
        self.access_order.clear();
        tracing::info!(cleared = count, "Reset prompt cache");
    }

    /// Remove expired entries from cache.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            self.invalidate(key);
        }
        if !expired.is_empty() {
            tracing::info!(
                removed = expired.len(),
                remaining = self.entries.len(),
                "Cleaned up expired prompt entries"
            );
        }
        expired.len()
    }

    /// Get number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key) {
            self.access_order.remove(pos);
        }
        self.access_order.push(key.to_string());
    }

    fn evict_lru(&mut self) {
        if !self.access_order.is_empty() {
            let key = self.access_order.remove(0);
            tracing::debug!(key = %key, "Evicting LRU entry");
            self.entries.remove(&key);
        }
    }
}

impl Default for PromptCache {
    fn default() -> Self {
        Self::new(PromptCacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_eviction() {
        let config = PromptCacheConfig::default().with_max_size(2);
        let mut cache = PromptCache::new(config);
        cache.insert("a", "1");
        cache.insert("b", "2");
        assert!(cache.get("a").is_some());
        cache.insert("c", "3");

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let config = PromptCacheConfigBuilder::default()
            .ttl_secs(0u64)
            .build()
            .unwrap();
        let mut cache = PromptCache::new(config);
        cache.insert("a", "1");
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());

        cache.insert("b", "2");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.cleanup_expired(), 1);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let mut cache = PromptCache::new(PromptCacheConfig::default().with_enabled(false));
        cache.insert("a", "1");
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_reset_and_invalidate() {
        let mut cache = PromptCache::default();
        cache.insert("a", "1");
        cache.insert("b", "2");
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        cache.reset();
        assert!(cache.is_empty());
    }
}
