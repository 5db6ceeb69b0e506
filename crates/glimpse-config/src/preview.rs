//! Preview delivery configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which delivery path a preview should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewMode {
    /// Decide per preview from worker readiness, failures and preference.
    #[default]
    Auto,
    /// Always use the worker-backed serving path when it is ready.
    Isolated,
    /// Always embed the document inline.
    Inline,
}

impl std::str::FromStr for PreviewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "isolated" | "worker" => Ok(Self::Isolated),
            "inline" | "srcdoc" => Ok(Self::Inline),
            other => Err(format!("unknown preview mode: {other}")),
        }
    }
}

impl std::fmt::Display for PreviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Isolated => "isolated",
            Self::Inline => "inline",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default)]
    pub mode: PreviewMode,

    /// Automatic mode only picks isolated delivery when this is set.
    #[serde(default)]
    pub prefer_isolated: bool,

    /// Verified isolated-delivery failures before it is disabled for the session.
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,

    /// Verify isolated delivery end to end after each successful write.
    #[serde(default = "default_verify")]
    pub verify: bool,

    #[serde(default = "default_verify_timeout_ms")]
    pub verify_timeout_ms: u64,

    /// Minimum body length a verified response must have.
    #[serde(default = "default_min_body_length")]
    pub min_body_length: usize,

    /// Response header that marks a response as worker-served.
    #[serde(default = "default_marker_header")]
    pub marker_header: String,
}

impl PreviewConfig {
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            mode: PreviewMode::default(),
            prefer_isolated: false,
            max_failures: default_max_failures(),
            verify: default_verify(),
            verify_timeout_ms: default_verify_timeout_ms(),
            min_body_length: default_min_body_length(),
            marker_header: default_marker_header(),
        }
    }
}

fn default_max_failures() -> u32 {
    3
}

fn default_verify() -> bool {
    true
}

fn default_verify_timeout_ms() -> u64 {
    2000
}

fn default_min_body_length() -> usize {
    100
}

fn default_marker_header() -> String {
    "x-glimpse-preview".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_mode_from_str() {
        assert_eq!("auto".parse::<PreviewMode>().unwrap(), PreviewMode::Auto);
        assert_eq!("Worker".parse::<PreviewMode>().unwrap(), PreviewMode::Isolated);
        assert_eq!("srcdoc".parse::<PreviewMode>().unwrap(), PreviewMode::Inline);
        assert!("iframe".parse::<PreviewMode>().is_err());
    }

    #[test]
    fn test_preview_mode_display_roundtrips() {
        for mode in [PreviewMode::Auto, PreviewMode::Isolated, PreviewMode::Inline] {
            assert_eq!(mode.to_string().parse::<PreviewMode>().unwrap(), mode);
        }
    }
}
