//! Network fetch abstraction used by the resolver and preview verification.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single fetch.
///
/// Cloneable so one coalesced in-flight result can be handed to every
/// waiting caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("invalid request: {0}")]
    Invalid(String),
}

impl FetchError {
    pub fn network(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// A request descriptor. Its cache key is derived from method, URL and body.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: String,
    pub url: String,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            body: None,
            headers: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body),
            ..Self::get(url)
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn key(&self) -> super::CacheKey {
        super::cache_key(&self.method, &self.url, self.body.as_ref())
    }
}

/// A fully buffered response.
///
/// Header names are stored lowercased. Every consumer gets its own clone, so
/// reading the body never affects another caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FetchResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Performs network requests on behalf of the core.
#[async_trait]
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::*;

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// `Fetcher` backed by a shared `reqwest::Client`.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: reqwest::Client,
    }

    impl Default for HttpFetcher {
        fn default() -> Self {
            Self::new()
        }
    }

    impl HttpFetcher {
        pub fn new() -> Self {
            let client = reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new());
            Self { client }
        }

        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Fetcher for HttpFetcher {
        async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
            let method = reqwest::Method::from_bytes(request.method.as_bytes())
                .map_err(|e| FetchError::Invalid(format!("method {}: {e}", request.method)))?;
            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            if let Some(timeout) = request.timeout {
                builder = builder.timeout(timeout);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: request.url.clone(),
                        timeout: request.timeout.unwrap_or(DEFAULT_TIMEOUT),
                    }
                } else {
                    FetchError::network(&request.url, e)
                }
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::network(&request.url, e))?;

            Ok(FetchResponse {
                status,
                headers,
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = FetchResponse::ok("x").with_header("X-Glimpse-Preview", "1");
        assert_eq!(response.header("x-glimpse-preview"), Some("1"));
        assert_eq!(response.header("X-GLIMPSE-PREVIEW"), Some("1"));
    }

    #[test]
    fn test_request_key_tracks_body() {
        let a = FetchRequest::post("/api", serde_json::json!({"a": 1}));
        let b = FetchRequest::post("/api", serde_json::json!({"a": 2}));
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().with_header("accept", "*/*").key());
    }
}
