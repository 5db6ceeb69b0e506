//! Preview delivery.
//!
//! Two delivery modes exist. *Isolated* delivery hands the document to a
//! separate serving mechanism and points the preview at its URL. *Inline*
//! delivery embeds the whole document as `srcdoc`. The
//! [`PreviewModeController`] picks one per publish and the
//! [`PreviewCreator`] carries it out, falling back to inline on failure.

mod blob;
mod creator;
mod delivery;
mod mode;
mod verify;

pub use blob::{BlobError, BlobStore, BlobTracker, InMemoryBlobStore};
pub use creator::{CreatedPreview, PreviewCreator};
#[cfg(feature = "http")]
pub use delivery::HttpDelivery;
pub use delivery::{FILES_ENDPOINT, HEALTH_ENDPOINT, IsolatedDelivery, PREVIEW_PREFIX, with_build_param};
pub use mode::{DecisionReason, PreviewModeController, PreviewModeState};
pub use verify::{PreviewVerifier, VerificationFailure};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// `url` value of an inline preview; the content is in `srcdoc`.
pub const INLINE_URL: &str = "about:srcdoc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    Isolated,
    Inline,
}

/// The published preview.
///
/// Exactly one of `url` or `srcdoc` is the content source: when `srcdoc`
/// is set, `url` is [`INLINE_URL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub url: String,
    pub ready: bool,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srcdoc: Option<String>,
}

impl PreviewInfo {
    pub fn isolated(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ready: true,
            updated_at: Utc::now(),
            srcdoc: None,
        }
    }

    pub fn inline(html: impl Into<String>) -> Self {
        Self {
            url: INLINE_URL.to_string(),
            ready: true,
            updated_at: Utc::now(),
            srcdoc: Some(html.into()),
        }
    }

    pub fn mode(&self) -> DeliveryMode {
        if self.srcdoc.is_some() {
            DeliveryMode::Inline
        } else {
            DeliveryMode::Isolated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_preview_uses_sentinel_url() {
        let preview = PreviewInfo::inline("<p>x</p>");
        assert_eq!(preview.url, INLINE_URL);
        assert_eq!(preview.mode(), DeliveryMode::Inline);

        let preview = PreviewInfo::isolated("http://x/?build=1");
        assert_eq!(preview.mode(), DeliveryMode::Isolated);
        let json = serde_json::to_value(&preview).unwrap();
        assert!(json.get("srcdoc").is_none());
        assert!(json.get("updatedAt").is_some());
    }
}
