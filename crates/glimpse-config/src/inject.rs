//! Bundle injection configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectConfig {
    /// Utility-CSS runtime injected when compiled CSS cannot be trusted.
    #[serde(default = "default_cdn_runtime_url")]
    pub cdn_runtime_url: String,

    /// Compiled CSS shorter than this is treated as incomplete.
    #[serde(default = "default_min_css_length")]
    pub min_css_length: usize,

    /// Template comment replaced by the bundle loader.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for InjectConfig {
    fn default() -> Self {
        Self {
            cdn_runtime_url: default_cdn_runtime_url(),
            min_css_length: default_min_css_length(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_cdn_runtime_url() -> String {
    "https://cdn.tailwindcss.com".into()
}

fn default_min_css_length() -> usize {
    100
}

fn default_placeholder() -> String {
    "<!-- GLIMPSE_BUNDLE -->".into()
}
