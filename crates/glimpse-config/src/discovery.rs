//! File-based config discovery.
//!
//! Finds a configuration file in a project directory and layers it between
//! the built-in defaults and `GLIMPSE_*` environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde_json::Value;

use crate::config::GlimpseConfig;
use crate::error::{ConfigError, Result};

const TOML_NAME: &str = "glimpse.toml";
const PACKAGE_JSON: &str = "package.json";
const PACKAGE_FIELD: &str = "glimpse";
const ENV_PREFIX: &str = "GLIMPSE_";

/// Searches a project root for configuration.
///
/// # Example
///
/// ```no_run
/// use glimpse_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a config file in the root directory.
    ///
    /// Searches in this order:
    /// 1. `glimpse.toml`
    /// 2. `package.json` with a non-null `glimpse` field
    pub fn find(&self) -> Option<PathBuf> {
        let toml_path = self.root.join(TOML_NAME);
        if toml_path.is_file() {
            return Some(toml_path);
        }

        let pkg_path = self.root.join(PACKAGE_JSON);
        let content = fs::read_to_string(&pkg_path).ok()?;
        let parsed: Value = serde_json::from_str(&content).ok()?;
        match parsed.get(PACKAGE_FIELD) {
            Some(field) if !field.is_null() => Some(pkg_path),
            _ => None,
        }
    }

    /// Load defaults, then the discovered file (if any), then the environment.
    ///
    /// A missing file is not an error; the defaults plus environment apply.
    pub fn load(&self) -> Result<GlimpseConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(GlimpseConfig::default()));

        if let Some(path) = self.find() {
            tracing::debug!(path = %path.display(), "loading glimpse config");
            figment = if path.file_name() == Some(std::ffi::OsStr::new(PACKAGE_JSON)) {
                figment.merge(Serialized::defaults(Self::package_field(&path)?))
            } else {
                figment.merge(Toml::file(&path))
            };
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: GlimpseConfig = figment
            .extract()
            .map_err(|e| ConfigError::invalid("configuration", e))?;
        crate::validation::validate(&config)?;
        Ok(config)
    }

    /// Load and fail when no config file exists.
    pub fn load_required(&self) -> Result<GlimpseConfig> {
        if self.find().is_none() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    fn package_field(path: &Path) -> Result<Value> {
        let content =
            fs::read_to_string(path).map_err(|_| ConfigError::Unreadable(path.to_path_buf()))?;
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| ConfigError::invalid(PACKAGE_JSON, format!("Invalid JSON: {e}")))?;
        parsed
            .get(PACKAGE_FIELD)
            .cloned()
            .ok_or_else(|| ConfigError::invalid(PACKAGE_FIELD, "missing from package.json"))
    }
}

/// Discover and load config from the current directory.
pub fn discover() -> Result<GlimpseConfig> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(root).load()
}
