//! Module cache and CDN resolver.
//!
//! Responses for externally hosted packages are kept in an in-memory LRU
//! keyed by [`CacheKey`]. Nothing is persisted; a new session starts cold.
//!
//! # Architecture
//!
//! - **Deterministic keys**: FNV-1a over method, URL and a structural body hash
//! - **LRU eviction**: least recently used entry goes once capacity is exceeded
//! - **Stale fallback**: entries older than the TTL are re-fetched, but still
//!   served when the re-fetch fails
//! - **Coalescing**: concurrent requests for one key share a single fetch
//!   (see [`ModuleResolver`])

mod fetch;
mod key;
mod resolver;

pub use fetch::{FetchError, FetchRequest, FetchResponse, Fetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use key::{CacheKey, cache_key, hash_value};
pub use resolver::ModuleResolver;

use glimpse_config::CacheConfig;
use lru::LruCache;
use serde::Serialize;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// One cached response.
#[derive(Debug, Clone)]
pub struct ModuleCacheEntry {
    pub key: CacheKey,
    pub value: FetchResponse,
    pub stored_at: Instant,
    pub last_access: Instant,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Fresh(FetchResponse),
    /// Present but older than the TTL.
    Stale(FetchResponse),
    Missing,
}

/// Observability counters, reported as a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub dedups: u64,
    pub stale_hits: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Bounded LRU of fetched modules.
#[derive(Debug)]
pub struct ModuleCache {
    entries: LruCache<CacheKey, ModuleCacheEntry>,
    ttl: Option<Duration>,
    evictions: u64,
}

impl ModuleCache {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
            evictions: 0,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Fresh entries only. Promotes the entry on a hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<FetchResponse> {
        match self.lookup(key) {
            Lookup::Fresh(value) => Some(value),
            Lookup::Stale(_) | Lookup::Missing => None,
        }
    }

    pub fn lookup(&mut self, key: &CacheKey) -> Lookup {
        let ttl = self.ttl;
        let Some(entry) = self.entries.get_mut(key) else {
            return Lookup::Missing;
        };
        let now = Instant::now();
        entry.last_access = now;
        let expired = ttl.is_some_and(|ttl| now.duration_since(entry.stored_at) >= ttl);
        if expired {
            Lookup::Stale(entry.value.clone())
        } else {
            Lookup::Fresh(entry.value.clone())
        }
    }

    /// Insert or replace. Returns the key evicted to make room, if any.
    pub fn set(&mut self, key: CacheKey, value: FetchResponse) -> Option<CacheKey> {
        let now = Instant::now();
        let entry = ModuleCacheEntry {
            key,
            value,
            stored_at: now,
            last_access: now,
        };
        match self.entries.push(key, entry) {
            Some((old_key, _)) if old_key != key => {
                self.evictions += 1;
                tracing::debug!(evicted = %old_key, "module cache full, evicted LRU entry");
                Some(old_key)
            }
            _ => None,
        }
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    pub fn remove(&mut self, key: &CacheKey) -> Option<FetchResponse> {
        self.entries.pop(key).map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
