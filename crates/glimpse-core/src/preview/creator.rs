//! Executes the delivery decision and builds the published [`PreviewInfo`].

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::blob::{BlobStore, BlobTracker};
use super::delivery::{IsolatedDelivery, with_build_param};
use super::mode::PreviewModeController;
use super::verify::PreviewVerifier;
use super::{DeliveryMode, PreviewInfo};

/// Result of one [`PreviewCreator::create_preview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPreview {
    pub preview: PreviewInfo,
    pub mode: DeliveryMode,
    pub build_id: u64,
    /// Object URL holding the same document, isolated mode only. Owned by
    /// the creator; revoked when it is replaced, on inline fallback and on
    /// cleanup.
    pub blob_url: Option<String>,
}

#[derive(Debug)]
pub struct PreviewCreator {
    controller: Arc<PreviewModeController>,
    delivery: RwLock<Option<Arc<dyn IsolatedDelivery>>>,
    verifier: Option<PreviewVerifier>,
    blobs: BlobTracker,
    next_build: AtomicU64,
    /// Build whose document the live blob holds.
    blob_build: AtomicU64,
}

impl PreviewCreator {
    pub fn new(
        controller: Arc<PreviewModeController>,
        blob_store: Arc<dyn BlobStore>,
        verifier: Option<PreviewVerifier>,
    ) -> Self {
        Self {
            controller,
            delivery: RwLock::new(None),
            verifier,
            blobs: BlobTracker::new(blob_store),
            next_build: AtomicU64::new(0),
            blob_build: AtomicU64::new(0),
        }
    }

    pub fn controller(&self) -> &Arc<PreviewModeController> {
        &self.controller
    }

    pub fn set_delivery(&self, delivery: Option<Arc<dyn IsolatedDelivery>>) {
        *self.delivery.write() = delivery;
    }

    pub fn has_delivery(&self) -> bool {
        self.delivery.read().is_some()
    }

    /// Monotonically increasing, starting at 1.
    pub fn next_build_id(&self) -> u64 {
        self.next_build.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn last_build_id(&self) -> u64 {
        self.next_build.load(Ordering::Relaxed)
    }

    /// Deliver `html`, isolated when the controller allows it, else inline.
    ///
    /// A rejected write or failed verification counts as one failure and
    /// falls through to inline delivery for this publish.
    pub async fn create_preview(&self, html: &str) -> CreatedPreview {
        let build_id = self.next_build_id();

        let delivery = self.delivery.read().clone();
        match delivery {
            Some(delivery) if self.controller.should_attempt_isolated() => {
                if let Some((preview, blob_url)) = self.try_isolated(delivery.as_ref(), html, build_id).await {
                    return CreatedPreview {
                        preview,
                        mode: DeliveryMode::Isolated,
                        build_id,
                        blob_url,
                    };
                }
            }
            _ => {
                tracing::debug!(
                    reason = %self.controller.decision_reason(),
                    build_id,
                    "using inline delivery"
                );
            }
        }

        CreatedPreview {
            preview: self.inline(html),
            mode: DeliveryMode::Inline,
            build_id,
            blob_url: None,
        }
    }

    async fn try_isolated(
        &self,
        delivery: &dyn IsolatedDelivery,
        html: &str,
        build_id: u64,
    ) -> Option<(PreviewInfo, Option<String>)> {
        let files = BTreeMap::from([("/index.html".to_string(), html.to_string())]);
        if !delivery.set_preview_files(&files, build_id).await {
            let failures = self.controller.record_failure();
            tracing::warn!(build_id, failures, "isolated write rejected, falling back to inline");
            return None;
        }

        let url = with_build_param(&delivery.preview_url(), build_id);
        if let Some(verifier) = &self.verifier {
            if let Err(failure) = verifier.verify(&url).await {
                let failures = self.controller.record_failure();
                tracing::warn!(build_id, failures, %failure, "isolated preview failed verification");
                return None;
            }
        }

        let blob_url = self.replace_blob(html, build_id);
        tracing::info!(build_id, %url, "isolated preview published");
        Some((PreviewInfo::isolated(url), blob_url))
    }

    /// Swap the live blob for this build's document. A build that finished
    /// delivery after a newer one leaves the newer blob alone.
    fn replace_blob(&self, html: &str, build_id: u64) -> Option<String> {
        if self.blob_build.fetch_max(build_id, Ordering::AcqRel) > build_id {
            tracing::debug!(build_id, "newer build owns the preview blob");
            return None;
        }
        match self.blobs.replace(html, "text/html") {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(error = %err, "could not create preview blob");
                None
            }
        }
    }

    fn inline(&self, html: &str) -> PreviewInfo {
        if !self.blobs.is_empty() {
            let revoked = self.blobs.revoke_all();
            tracing::debug!(revoked, "revoked stale isolated blob before inline delivery");
        }
        PreviewInfo::inline(html)
    }

    /// Current isolated-mode object URL, if one is live.
    pub fn current_blob(&self) -> Option<String> {
        self.blobs.current()
    }

    /// Revoke everything this creator owns.
    pub fn cleanup(&self) -> usize {
        self.blobs.revoke_all()
    }
}
