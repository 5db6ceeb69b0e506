//! Router generation configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterStrategy {
    /// Route list wrapped in a router library shell.
    #[default]
    Declarative,
    /// Dependency-free router driven by `location.hash`.
    Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Internal links above this count flag a multi-page project.
    #[serde(default = "default_link_threshold")]
    pub link_threshold: usize,

    #[serde(default)]
    pub strategy: RouterStrategy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            link_threshold: default_link_threshold(),
            strategy: RouterStrategy::default(),
        }
    }
}

fn default_link_threshold() -> usize {
    3
}
