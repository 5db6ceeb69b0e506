//! Semantic validation that serde cannot express.

use crate::config::GlimpseConfig;
use crate::error::{ConfigError, Result};

pub fn validate(config: &GlimpseConfig) -> Result<()> {
    let mut problems = Vec::new();

    if config.cache.capacity == 0 {
        problems.push("cache.capacity must be at least 1");
    }
    if config.cache.cdn_base.trim().is_empty() {
        problems.push("cache.cdn_base must not be empty");
    }
    if config.preview.max_failures == 0 {
        problems.push("preview.max_failures must be at least 1");
    }
    if config.preview.verify_timeout_ms == 0 {
        problems.push("preview.verify_timeout_ms must be positive");
    }
    if config.preview.marker_header.trim().is_empty() {
        problems.push("preview.marker_header must not be empty");
    }
    if config.hmr.namespace.trim().is_empty() {
        problems.push("hmr.namespace must not be empty");
    }
    if config.inject.placeholder.trim().is_empty() {
        problems.push("inject.placeholder must not be empty");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&GlimpseConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = GlimpseConfig::default();
        config.cache.capacity = 0;
        config.preview.max_failures = 0;

        let msg = validate(&config).unwrap_err().to_string();
        assert!(msg.contains("cache.capacity"));
        assert!(msg.contains("preview.max_failures"));
    }
}
