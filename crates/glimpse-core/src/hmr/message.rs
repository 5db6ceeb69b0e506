//! Hot-update message protocol.
//!
//! ```json
//! {"type":"glimpse-hmr","action":"css-update","payload":{"css":"…","timestamp":1700000000000}}
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HmrAction {
    CssUpdate,
    FullReload,
    AssetUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmrPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<u64>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: HmrAction,
    pub payload: HmrPayload,
}

impl HmrMessage {
    fn new(namespace: &str, action: HmrAction, payload: HmrPayload) -> Self {
        Self {
            kind: format!("{namespace}-hmr"),
            action,
            payload,
        }
    }

    fn payload(build_id: Option<u64>) -> HmrPayload {
        HmrPayload {
            css: None,
            path: None,
            build_id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn css_update(namespace: &str, css: String, build_id: Option<u64>) -> Self {
        let payload = HmrPayload {
            css: Some(css),
            ..Self::payload(build_id)
        };
        Self::new(namespace, HmrAction::CssUpdate, payload)
    }

    pub fn full_reload(namespace: &str, path: Option<String>, build_id: Option<u64>) -> Self {
        let payload = HmrPayload {
            path,
            ..Self::payload(build_id)
        };
        Self::new(namespace, HmrAction::FullReload, payload)
    }

    pub fn asset_update(namespace: &str, path: String, build_id: Option<u64>) -> Self {
        let payload = HmrPayload {
            path: Some(path),
            ..Self::payload(build_id)
        };
        Self::new(namespace, HmrAction::AssetUpdate, payload)
    }
}

/// One-way, best-effort channel to the live preview.
pub trait PreviewChannel: Send + Sync + std::fmt::Debug {
    fn post_message(&self, message: &HmrMessage);
}

/// Fans messages out to any number of subscribers (e.g. SSE clients).
#[derive(Debug, Clone)]
pub struct BroadcastChannel {
    sender: broadcast::Sender<HmrMessage>,
}

impl BroadcastChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }
}

impl PreviewChannel for BroadcastChannel {
    fn post_message(&self, message: &HmrMessage) {
        // No receivers is fine: nobody is watching the preview.
        let _ = self.sender.send(message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let message = HmrMessage::css_update("glimpse", "a{}".into(), Some(3));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "glimpse-hmr");
        assert_eq!(json["action"], "css-update");
        assert_eq!(json["payload"]["css"], "a{}");
        assert_eq!(json["payload"]["buildId"], 3);
        assert!(json["payload"]["timestamp"].as_i64().unwrap() > 0);
        assert!(json["payload"].get("path").is_none());

        let reload = HmrMessage::full_reload("acme", None, None);
        let json = serde_json::to_value(&reload).unwrap();
        assert_eq!(json["type"], "acme-hmr");
        assert_eq!(json["action"], "full-reload");
    }

    #[tokio::test]
    async fn test_broadcast_channel_delivers() {
        let channel = BroadcastChannel::new(8);
        let mut rx = channel.subscribe();
        channel.post_message(&HmrMessage::full_reload("glimpse", None, None));
        assert_eq!(rx.recv().await.unwrap().action, HmrAction::FullReload);
    }
}
