//! Cache-fronted module resolution with in-flight coalescing.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use glimpse_config::CacheConfig;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CacheKey, CacheStats, FetchError, FetchRequest, FetchResponse, Fetcher, Lookup, ModuleCache};

type SharedFetch = Shared<BoxFuture<'static, Result<FetchResponse, FetchError>>>;

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    dedups: AtomicU64,
    stale_hits: AtomicU64,
}

/// Resolves request descriptors through the module cache.
///
/// Concurrent calls that share a key are coalesced into one call to the
/// underlying [`Fetcher`]. Each caller receives its own clone of the
/// response.
pub struct ModuleResolver {
    fetcher: Arc<dyn Fetcher>,
    cache: Mutex<ModuleCache>,
    inflight: Mutex<FxHashMap<CacheKey, SharedFetch>>,
    counters: Counters,
    cdn_base: String,
}

impl std::fmt::Debug for ModuleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleResolver")
            .field("fetcher", &self.fetcher)
            .field("cdn_base", &self.cdn_base)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Drops the in-flight slot when the owning caller finishes or is cancelled.
struct InflightGuard<'a> {
    inflight: &'a Mutex<FxHashMap<CacheKey, SharedFetch>>,
    key: CacheKey,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.inflight.lock().remove(&self.key);
    }
}

impl ModuleResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &CacheConfig) -> Self {
        Self {
            fetcher,
            cache: Mutex::new(ModuleCache::from_config(config)),
            inflight: Mutex::new(FxHashMap::default()),
            counters: Counters::default(),
            cdn_base: config.cdn_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        Arc::clone(&self.fetcher)
    }

    /// CDN URL for a bare specifier such as `react@18` or `lodash/debounce`.
    pub fn package_url(&self, specifier: &str) -> String {
        format!("{}/{}", self.cdn_base, specifier.trim_start_matches('/'))
    }

    /// Fetch a bare package from the CDN and return its source text.
    pub async fn resolve_package(&self, specifier: &str) -> Result<String, FetchError> {
        let request = FetchRequest::get(self.package_url(specifier));
        self.resolve(&request).await.map(|response| response.body)
    }

    /// Resolve one request.
    ///
    /// Order: fresh cache entry, then an in-flight fetch for the same key,
    /// then a new fetch. A failed or non-2xx fetch falls back to a stale
    /// entry when one exists.
    pub async fn resolve(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let key = request.key();

        let stale = match self.cache.lock().lookup(&key) {
            Lookup::Fresh(response) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(url = %request.url, %key, "module cache hit");
                return Ok(response);
            }
            Lookup::Stale(response) => Some(response),
            Lookup::Missing => None,
        };

        let (pending, guard) = {
            let mut inflight = self.inflight.lock();
            if let Some(pending) = inflight.get(&key) {
                self.counters.dedups.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %request.url, "joining in-flight fetch");
                (pending.clone(), None)
            } else {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                let fetcher = Arc::clone(&self.fetcher);
                let owned = request.clone();
                let pending = async move { fetcher.fetch(&owned).await }.boxed().shared();
                inflight.insert(key, pending.clone());
                let guard = InflightGuard {
                    inflight: &self.inflight,
                    key,
                };
                (pending, Some(guard))
            }
        };
        let is_owner = guard.is_some();

        let outcome = pending.await.and_then(|response| {
            if response.is_success() {
                Ok(response)
            } else {
                Err(FetchError::Status {
                    url: request.url.clone(),
                    status: response.status,
                })
            }
        });

        match outcome {
            Ok(response) => {
                if is_owner {
                    self.cache.lock().set(key, response.clone());
                }
                Ok(response)
            }
            Err(err) => match stale {
                Some(response) => {
                    self.counters.stale_hits.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(url = %request.url, error = %err, "fetch failed, serving stale module");
                    Ok(response)
                }
                None => Err(err),
            },
        }
    }

    /// Drop a single entry, e.g. after the host reports a broken module.
    pub fn invalidate(&self, request: &FetchRequest) -> bool {
        self.cache.lock().remove(&request.key()).is_some()
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            dedups: self.counters.dedups.load(Ordering::Relaxed),
            stale_hits: self.counters.stale_hits.load(Ordering::Relaxed),
            evictions: cache.evictions(),
            entries: cache.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct ScriptedFetcher {
        calls: AtomicUsize,
        offline: AtomicBool,
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            if self.offline.load(Ordering::SeqCst) {
                return Err(FetchError::network(&request.url, "offline"));
            }
            if request.url.ends_with("/missing") {
                return Ok(FetchResponse::ok("not found").with_status(404));
            }
            Ok(FetchResponse::ok(format!("// {} #{n}", request.url)))
        }
    }

    fn resolver(fetcher: Arc<ScriptedFetcher>, ttl_secs: Option<u64>) -> ModuleResolver {
        let config = CacheConfig {
            ttl_secs,
            ..CacheConfig::default()
        };
        ModuleResolver::new(fetcher, &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_are_coalesced() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let resolver = resolver(Arc::clone(&fetcher), None);
        let request = FetchRequest::get("https://esm.sh/react");

        let results =
            futures::future::join_all((0..5).map(|_| resolver.resolve(&request))).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        for result in &results {
            assert_eq!(result.as_ref().unwrap().body, "// https://esm.sh/react #0");
        }
        let stats = resolver.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.dedups, 4);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_hits_cache() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let resolver = resolver(Arc::clone(&fetcher), None);

        resolver.resolve_package("react@18").await.unwrap();
        let body = resolver.resolve_package("/react@18").await.unwrap();

        assert_eq!(body, "// https://esm.sh/react@18 #0");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_served_when_offline() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let resolver = resolver(Arc::clone(&fetcher), Some(10));

        resolver.resolve_package("vue").await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        fetcher.offline.store(true, Ordering::SeqCst);

        let body = resolver.resolve_package("vue").await.unwrap();
        assert_eq!(body, "// https://esm.sh/vue #0");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(resolver.stats().stale_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_without_cache_propagates() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        fetcher.offline.store(true, Ordering::SeqCst);
        let resolver = resolver(fetcher, None);

        let err = resolver.resolve_package("preact").await.unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
        assert_eq!(resolver.stats().entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_status_is_not_cached() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let resolver = resolver(Arc::clone(&fetcher), None);

        let err = resolver.resolve_package("missing").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                url: "https://esm.sh/missing".into(),
                status: 404
            }
        );
        resolver.resolve_package("missing").await.unwrap_err();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
