//! View cache
//!
//! Stores the resolved (template, context) pair for a content slug so repeat
//! requests skip markdown rendering. Each entry remembers when it expires, so
//! the `Expires` header stays the same for every hit on that entry.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::config::ViewCacheConfig;
use crate::content::ContextMap;

/// A cached content render
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Page template to render the context with
    pub template: String,
    pub context: ContextMap,
    pub expires_at: SystemTime,
}

impl CacheEntry {
    /// Lifetimes past [`ViewCacheConfig::MAX_SECONDS`] are shortened to it
    pub fn new(template: String, context: ContextMap, ttl: Duration) -> Self {
        let now = SystemTime::now();
        let ttl = ttl.min(Duration::from_secs(ViewCacheConfig::MAX_SECONDS));
        Self {
            template,
            context,
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }

    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires_at
    }
}

/// Storage for cache entries
pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Option<CacheEntry>;
    fn set(&self, key: &str, entry: CacheEntry);
}

/// In-process cache; expired entries are dropped when read
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheBackend for MemoryCache {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?.clone();
        if entry.is_expired() {
            self.entries.remove(key);
            return None;
        }
        Some(entry)
    }

    fn set(&self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
    }
}

/// Cache front that is a no-op when caching is disabled
#[derive(Clone)]
pub struct ViewCache {
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
}

impl ViewCache {
    /// In-memory cache when `seconds > 0`, otherwise disabled
    pub fn from_config(config: &ViewCacheConfig) -> Self {
        if !config.is_enabled() {
            return Self::disabled();
        }
        Self::with_backend(Arc::new(MemoryCache::new()), config.seconds)
    }

    /// `seconds` is capped at [`ViewCacheConfig::MAX_SECONDS`]
    pub fn with_backend(backend: Arc<dyn CacheBackend>, seconds: u64) -> Self {
        Self {
            backend: Some(backend),
            ttl: Duration::from_secs(seconds.min(ViewCacheConfig::MAX_SECONDS)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            ttl: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get_if_enabled(&self, slug: &str) -> Option<CacheEntry> {
        let entry = self.backend.as_ref()?.get(slug);
        tracing::debug!(
            "View cache {} for {}",
            if entry.is_some() { "hit" } else { "miss" },
            slug
        );
        entry
    }

    /// Store an entry; returns it back so callers can keep using it
    pub fn set_if_enabled(&self, slug: &str, entry: CacheEntry) -> CacheEntry {
        if let Some(backend) = &self.backend {
            backend.set(slug, entry.clone());
        }
        entry
    }

    /// Build an entry that expires one TTL from now
    pub fn entry(&self, template: String, context: ContextMap) -> CacheEntry {
        CacheEntry::new(template, context, self.ttl)
    }
}
