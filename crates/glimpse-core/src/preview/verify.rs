//! End-to-end check of an isolated preview URL.

use glimpse_config::PreviewConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{FetchError, FetchRequest, Fetcher};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationFailure {
    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(#[from] FetchError),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("response lacks the '{0}' marker header")]
    MissingMarker(String),

    #[error("body is {len} bytes, expected at least {min}")]
    BodyTooShort { len: usize, min: usize },
}

/// Fetches a served preview and checks it came from the delivery worker.
#[derive(Debug, Clone)]
pub struct PreviewVerifier {
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
    marker_header: String,
    min_body_length: usize,
}

impl PreviewVerifier {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: &PreviewConfig) -> Self {
        Self {
            fetcher,
            timeout: config.verify_timeout(),
            marker_header: config.marker_header.clone(),
            min_body_length: config.min_body_length,
        }
    }

    /// Bounded by the configured timeout even if the fetcher ignores it.
    pub async fn verify(&self, url: &str) -> Result<(), VerificationFailure> {
        let request = FetchRequest::get(url).with_timeout(self.timeout);
        let response = tokio::time::timeout(self.timeout, self.fetcher.fetch(&request))
            .await
            .map_err(|_| VerificationFailure::Timeout(self.timeout))?
            .map_err(|err| match err {
                FetchError::Timeout { .. } => VerificationFailure::Timeout(self.timeout),
                other => VerificationFailure::Request(other),
            })?;

        if !response.is_success() {
            return Err(VerificationFailure::Status(response.status));
        }
        if response.header(&self.marker_header).is_none() {
            return Err(VerificationFailure::MissingMarker(self.marker_header.clone()));
        }
        if response.body.len() < self.min_body_length {
            return Err(VerificationFailure::BodyTooShort {
                len: response.body.len(),
                min: self.min_body_length,
            });
        }
        Ok(())
    }
}
