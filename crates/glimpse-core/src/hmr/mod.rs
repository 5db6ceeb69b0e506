//! Hot updates for the live preview.
//!
//! Changes are classified, batched over a quiet period and turned into
//! either one style update or one full reload.

mod classify;
mod manager;
mod message;

pub use classify::{ChangeType, classify};
pub use manager::{HmrManager, PendingChange, RebuildHook, process_batch};
pub use message::{BroadcastChannel, HmrAction, HmrMessage, HmrPayload, PreviewChannel};
