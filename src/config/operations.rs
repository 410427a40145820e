//! Config loading, validation and conversion.

use super::model::Config;
use crate::error::{LeaseError, Result};
use crate::lease::LeaseConfig;
use std::path::Path;

impl Config {
    /// Load and validate config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            LeaseError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config if the file exists, defaults otherwise.
    ///
    /// A file that exists but does not parse or validate is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty mapping.
        let config: Config = if yaml.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| {
                LeaseError::UserError(format!("failed to parse config YAML: {}", e))
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            LeaseError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// - `default_ttl_ms` must be positive
    /// - `guard_stale_minutes` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_ms == 0 {
            return Err(LeaseError::UserError(
                "config validation failed: default_ttl_ms must be greater than 0".to_string(),
            ));
        }

        if self.guard_stale_minutes == 0 {
            return Err(LeaseError::UserError(
                "config validation failed: guard_stale_minutes must be greater than 0"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// The lease settings derived from this config.
    pub fn lease_config(&self) -> LeaseConfig {
        LeaseConfig {
            default_ttl_ms: self.default_ttl_ms,
        }
    }
}
