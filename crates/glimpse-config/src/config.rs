//! Top-level configuration structure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheConfig;
use crate::error::{ConfigError, Result};
use crate::hmr::{BuildConfig, HmrConfig};
use crate::inject::InjectConfig;
use crate::preview::PreviewConfig;
use crate::router::RouterConfig;
use crate::settings::GlobalSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlimpseConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub preview: PreviewConfig,

    #[serde(default)]
    pub hmr: HmrConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub inject: InjectConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub settings: GlobalSettings,
}

impl GlimpseConfig {
    /// Create from a `serde_json::Value`, for configuration stored alongside a
    /// project or sent by a host application.
    ///
    /// # Example
    ///
    /// ```
    /// use glimpse_config::{GlimpseConfig, PreviewMode};
    /// use serde_json::json;
    ///
    /// let config = GlimpseConfig::from_value(json!({
    ///     "preview": { "mode": "inline" },
    ///     "hmr": { "debounce_ms": 50 }
    /// }))
    /// .unwrap();
    ///
    /// assert_eq!(config.preview.mode, PreviewMode::Inline);
    /// assert_eq!(config.hmr.debounce_ms, 50);
    /// assert_eq!(config.cache.capacity, 256);
    /// ```
    pub fn from_value(value: Value) -> Result<Self> {
        let config: GlimpseConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::invalid("config", e))?;
        crate::validation::validate(&config)?;
        Ok(config)
    }

    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| ConfigError::invalid("config", e))
    }
}
