//! Isolated delivery contract.
//!
//! An isolated delivery mechanism stores a build's files and serves them
//! from its own origin, marking every response with a header so the
//! verifier can tell worker-served content from anything else.

use async_trait::async_trait;
use std::collections::BTreeMap;

/// Endpoint receiving a build's files (`PUT ?build=<id>&session=<token>`).
pub const FILES_ENDPOINT: &str = "/__glimpse__/files";
/// Prefix the stored files are served under.
pub const PREVIEW_PREFIX: &str = "/__glimpse__/preview/";
pub const HEALTH_ENDPOINT: &str = "/__glimpse__/health";

#[async_trait]
pub trait IsolatedDelivery: Send + Sync + std::fmt::Debug {
    /// Store `files` for `build_id`. `false` means the write was rejected.
    async fn set_preview_files(&self, files: &BTreeMap<String, String>, build_id: u64) -> bool;

    /// Base URL the current files are served from.
    fn preview_url(&self) -> String;

    /// Whether the mechanism is ready to take writes.
    async fn ready(&self) -> bool {
        true
    }
}

/// Append the build id as a cache-busting query parameter.
pub fn with_build_param(url: &str, build_id: u64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}build={build_id}")
}

#[cfg(feature = "http")]
pub use http::HttpDelivery;

#[cfg(feature = "http")]
mod http {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    static SESSIONS: AtomicU64 = AtomicU64::new(0);

    /// Unique per delivery client, so build ids from different sessions
    /// never compete on the server.
    fn session_token() -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let seq = SESSIONS.fetch_add(1, Ordering::Relaxed);
        format!("{nanos:x}-{seq}")
    }

    /// Talks to a `glimpse serve` instance.
    #[derive(Debug, Clone)]
    pub struct HttpDelivery {
        base_url: String,
        session: String,
        client: reqwest::Client,
    }

    impl HttpDelivery {
        pub fn new(base_url: impl Into<String>) -> Self {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new());
            Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                session: session_token(),
                client,
            }
        }

        /// Use a fixed session token, e.g. to resume after a host reload
        /// while keeping the build counter.
        pub fn with_session(mut self, session: impl Into<String>) -> Self {
            self.session = session.into();
            self
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        pub fn session(&self) -> &str {
            &self.session
        }
    }

    #[async_trait]
    impl IsolatedDelivery for HttpDelivery {
        async fn set_preview_files(&self, files: &BTreeMap<String, String>, build_id: u64) -> bool {
            let url = format!("{}{FILES_ENDPOINT}", self.base_url);
            let body = json!({ "buildId": build_id, "session": self.session, "files": files });
            let build = build_id.to_string();
            match self
                .client
                .put(&url)
                .query(&[("build", build.as_str()), ("session", self.session.as_str())])
                .json(&body)
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => true,
                Ok(response) => {
                    tracing::warn!(status = %response.status(), build_id, "isolated delivery rejected files");
                    false
                }
                Err(err) => {
                    tracing::warn!(error = %err, build_id, "isolated delivery unreachable");
                    false
                }
            }
        }

        fn preview_url(&self) -> String {
            format!("{}{PREVIEW_PREFIX}", self.base_url)
        }

        async fn ready(&self) -> bool {
            let url = format!("{}{HEALTH_ENDPOINT}", self.base_url);
            matches!(self.client.get(&url).send().await, Ok(r) if r.status().is_success())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_param() {
        assert_eq!(with_build_param("http://h/p/", 7), "http://h/p/?build=7");
        assert_eq!(with_build_param("http://h/p/?x=1", 7), "http://h/p/?x=1&build=7");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_each_client_gets_its_own_session() {
        let first = HttpDelivery::new("http://127.0.0.1:7878/");
        let second = HttpDelivery::new("http://127.0.0.1:7878");
        assert_ne!(first.session(), second.session());
        assert_eq!(first.base_url(), second.base_url());

        let resumed = second.with_session(first.session());
        assert_eq!(resumed.session(), first.session());
    }
}
