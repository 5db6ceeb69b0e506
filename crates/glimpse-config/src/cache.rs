//! Module cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of resolved modules kept before LRU eviction.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Age after which an entry is stale. Stale entries are re-fetched but
    /// still served when the network fails.
    #[serde(default)]
    pub ttl_secs: Option<u64>,

    /// Base URL that bare package specifiers are resolved against.
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: None,
            cdn_base: default_cdn_base(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

fn default_cdn_base() -> String {
    "https://esm.sh".into()
}
