//! Hot update and rebuild scheduling configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrConfig {
    #[serde(default = "default_hmr_debounce_ms")]
    pub debounce_ms: u64,

    /// Message namespace; envelopes are typed `<namespace>-hmr`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl HmrConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn message_type(&self) -> String {
        format!("{}-hmr", self.namespace)
    }
}

impl Default for HmrConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_hmr_debounce_ms(),
            namespace: default_namespace(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Quiet window before a scheduled full build runs.
    #[serde(default = "default_build_debounce_ms")]
    pub debounce_ms: u64,
}

impl BuildConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_build_debounce_ms(),
        }
    }
}

fn default_hmr_debounce_ms() -> u64 {
    100
}

fn default_build_debounce_ms() -> u64 {
    300
}

fn default_namespace() -> String {
    "glimpse".into()
}
