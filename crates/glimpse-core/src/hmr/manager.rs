//! Debounced change batching and update propagation.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use super::classify::{ChangeType, classify};
use super::message::{HmrAction, HmrMessage, PreviewChannel};
use crate::scheduler::Debouncer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub path: String,
    pub content: String,
    pub change_type: ChangeType,
}

/// Called with the batch when a change needs a full rebuild.
pub type RebuildHook = Arc<dyn Fn(&[PendingChange]) + Send + Sync>;

/// Decide what a batch turns into.
///
/// Any script or config change means one full reload and nothing else.
/// Otherwise the style texts (latest content per path, in first-seen
/// order) are concatenated into one css update. Asset changes produce no
/// message: consumers load them by content-addressed URL.
pub fn process_batch(namespace: &str, batch: &[PendingChange], build_id: Option<u64>) -> Option<HmrMessage> {
    if let Some(trigger) = batch
        .iter()
        .find(|c| matches!(c.change_type, ChangeType::Script | ChangeType::Config))
    {
        return Some(HmrMessage::full_reload(
            namespace,
            Some(trigger.path.clone()),
            build_id,
        ));
    }

    let mut styles: Vec<(&str, &str)> = Vec::new();
    for change in batch {
        match change.change_type {
            ChangeType::Style => match styles.iter_mut().find(|(path, _)| *path == change.path) {
                Some(slot) => slot.1 = &change.content,
                None => styles.push((&change.path, &change.content)),
            },
            ChangeType::Asset => {
                tracing::debug!(path = %change.path, "asset changed, self-invalidating by URL");
            }
            ChangeType::Unknown => {
                tracing::trace!(path = %change.path, "ignoring change of unknown type");
            }
            ChangeType::Script | ChangeType::Config => {}
        }
    }

    if styles.is_empty() {
        return None;
    }
    let css = styles
        .iter()
        .map(|(_, content)| *content)
        .collect::<Vec<_>>()
        .join("\n");
    Some(HmrMessage::css_update(namespace, css, build_id))
}

struct HmrInner {
    namespace: String,
    pending: Mutex<Vec<PendingChange>>,
    channel: RwLock<Option<Arc<dyn PreviewChannel>>>,
    rebuild: RwLock<Option<RebuildHook>>,
    build_id: AtomicU64,
    destroyed: AtomicBool,
}

impl std::fmt::Debug for HmrInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmrInner")
            .field("namespace", &self.namespace)
            .field("pending", &self.pending.lock().len())
            .field("destroyed", &self.destroyed.load(Ordering::Relaxed))
            .finish()
    }
}

impl HmrInner {
    fn flush(&self) -> Option<HmrMessage> {
        let batch = std::mem::take(&mut *self.pending.lock());
        if batch.is_empty() || self.destroyed.load(Ordering::Acquire) {
            return None;
        }
        let build_id = match self.build_id.load(Ordering::Relaxed) {
            0 => None,
            id => Some(id),
        };
        let message = process_batch(&self.namespace, &batch, build_id)?;
        tracing::debug!(
            action = ?message.action,
            changes = batch.len(),
            "propagating hot update"
        );

        let channel = self.channel.read().clone();
        if let Some(channel) = channel {
            channel.post_message(&message);
        }
        let hook = self.rebuild.read().clone();
        if let (HmrAction::FullReload, Some(hook)) = (message.action, hook) {
            hook(&batch);
        }
        Some(message)
    }
}

/// Collects file changes and pushes updates to the live preview.
#[derive(Debug, Clone)]
pub struct HmrManager {
    inner: Arc<HmrInner>,
    debouncer: Debouncer,
}

impl HmrManager {
    pub fn new(namespace: impl Into<String>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(HmrInner {
                namespace: namespace.into(),
                pending: Mutex::new(Vec::new()),
                channel: RwLock::new(None),
                rebuild: RwLock::new(None),
                build_id: AtomicU64::new(0),
                destroyed: AtomicBool::new(false),
            }),
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn from_config(config: &glimpse_config::HmrConfig) -> Self {
        Self::new(config.namespace.clone(), config.debounce())
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn set_channel(&self, channel: Option<Arc<dyn PreviewChannel>>) {
        *self.inner.channel.write() = channel;
    }

    pub fn set_rebuild_hook(&self, hook: Option<RebuildHook>) {
        *self.inner.rebuild.write() = hook;
    }

    /// Build id stamped on outgoing messages.
    pub fn set_build_id(&self, build_id: u64) {
        self.inner.build_id.store(build_id, Ordering::Relaxed);
    }

    /// Queue a change and restart the quiet period.
    ///
    /// Must be called within a tokio runtime. Ignored after [`destroy`](Self::destroy).
    pub fn notify_change(&self, path: impl Into<String>, content: impl Into<String>) -> ChangeType {
        let path = path.into();
        let change_type = classify(&path);
        if self.inner.destroyed.load(Ordering::Acquire) {
            return change_type;
        }
        self.inner.pending.lock().push(PendingChange {
            path,
            content: content.into(),
            change_type,
        });

        let inner = Arc::clone(&self.inner);
        self.debouncer.schedule(async move {
            inner.flush();
        });
        change_type
    }

    /// Process the pending batch now, skipping the quiet period.
    pub fn flush(&self) -> Option<HmrMessage> {
        self.debouncer.cancel();
        self.inner.flush()
    }

    pub fn pending(&self) -> Vec<PendingChange> {
        self.inner.pending.lock().clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    /// Cancel the timer and drop all state and listeners.
    pub fn destroy(&self) {
        self.inner.destroyed.store(true, Ordering::Release);
        self.debouncer.cancel();
        self.inner.pending.lock().clear();
        *self.inner.channel.write() = None;
        *self.inner.rebuild.write() = None;
        tracing::debug!(namespace = %self.inner.namespace, "hmr manager destroyed");
    }
}
