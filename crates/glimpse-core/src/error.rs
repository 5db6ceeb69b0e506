//! Error types for the preview pipeline.
//!
//! Expected "nothing found" outcomes (no entry point, no router needed) are
//! modelled as `Option` values by the detectors and never appear here.

use thiserror::Error;

use crate::cache::FetchError;
use crate::preview::BlobError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] glimpse_config::ConfigError),

    #[error("module fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("compile failed: {0}")]
    Compile(String),

    #[error("isolated delivery failed: {0}")]
    Delivery(String),

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session closed")]
    SessionClosed,
}

impl Error {
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }
}
