//! Role cache configuration loading and validation

use crate::error::{Result, RoleCacheError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Role cache configuration
///
/// All values are plain constructor parameters. Nothing here is read from
/// the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RoleCacheConfig {
    /// Primary cache time-to-live in seconds
    #[serde(default = "default_primary_ttl")]
    pub primary_ttl_secs: u64,

    /// Maximum entries in the primary cache
    #[serde(default = "default_capacity")]
    pub primary_capacity: usize,

    /// Maximum entries in the fallback cache
    #[serde(default = "default_capacity")]
    pub fallback_capacity: usize,

    /// Fallback cache time-to-live in seconds (unbounded when absent)
    #[serde(default)]
    pub fallback_ttl_secs: Option<u64>,

    /// Expected number of concurrent accessors; sets the shard count
    #[serde(default = "default_concurrency_level")]
    pub concurrency_level: usize,

    /// Interval for the optional background health monitor
    #[serde(default = "default_health_poll_interval")]
    pub health_poll_interval_secs: u64,
}

fn default_primary_ttl() -> u64 {
    300
}

fn default_capacity() -> usize {
    500
}

fn default_concurrency_level() -> usize {
    10
}

fn default_health_poll_interval() -> u64 {
    10
}

impl Default for RoleCacheConfig {
    fn default() -> Self {
        Self {
            primary_ttl_secs: default_primary_ttl(),
            primary_capacity: default_capacity(),
            fallback_capacity: default_capacity(),
            fallback_ttl_secs: None,
            concurrency_level: default_concurrency_level(),
            health_poll_interval_secs: default_health_poll_interval(),
        }
    }
}

impl RoleCacheConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RoleCacheError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: RoleCacheConfig = toml::from_str(contents)
            .map_err(|e| RoleCacheError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the caches cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.primary_ttl_secs == 0 {
            return Err(RoleCacheError::InvalidConfig(
                "primary_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.primary_capacity == 0 {
            return Err(RoleCacheError::InvalidConfig(
                "primary_capacity must be greater than zero".to_string(),
            ));
        }
        if self.fallback_capacity == 0 {
            return Err(RoleCacheError::InvalidConfig(
                "fallback_capacity must be greater than zero".to_string(),
            ));
        }
        if self.concurrency_level == 0 {
            return Err(RoleCacheError::InvalidConfig(
                "concurrency_level must be greater than zero".to_string(),
            ));
        }
        if let Some(fallback_ttl) = self.fallback_ttl_secs {
            if fallback_ttl < self.primary_ttl_secs {
                return Err(RoleCacheError::InvalidConfig(format!(
                    "fallback_ttl_secs ({}) must not be shorter than primary_ttl_secs ({})",
                    fallback_ttl, self.primary_ttl_secs
                )));
            }
        }
        if self.health_poll_interval_secs == 0 {
            return Err(RoleCacheError::InvalidConfig(
                "health_poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn primary_ttl(&self) -> Duration {
        Duration::from_secs(self.primary_ttl_secs)
    }

    pub fn fallback_ttl(&self) -> Option<Duration> {
        self.fallback_ttl_secs.map(Duration::from_secs)
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RoleCacheConfig::default();
        assert_eq!(config.primary_ttl(), Duration::from_secs(300));
        assert_eq!(config.primary_capacity, 500);
        assert_eq!(config.fallback_capacity, 500);
        assert_eq!(config.fallback_ttl(), None);
        assert_eq!(config.concurrency_level, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = RoleCacheConfig::from_toml_str("primary_ttl_secs = 60\nfallback_ttl_secs = 86400\n")
            .unwrap();
        assert_eq!(config.primary_ttl_secs, 60);
        assert_eq!(config.fallback_ttl(), Some(Duration::from_secs(86_400)));
        assert_eq!(config.primary_capacity, 500);
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = RoleCacheConfig::from_toml_str("").unwrap();
        assert_eq!(config, RoleCacheConfig::default());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let config = RoleCacheConfig {
            primary_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RoleCacheError::InvalidConfig(_))));

        let result = RoleCacheConfig::from_toml_str("fallback_capacity = 0");
        assert!(matches!(result, Err(RoleCacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_fallback_shorter_than_primary() {
        let config = RoleCacheConfig {
            primary_ttl_secs: 300,
            fallback_ttl_secs: Some(60),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(RoleCacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = RoleCacheConfig::from_toml_str("primary_ttl_secs = \"five minutes\"");
        assert!(matches!(result, Err(RoleCacheError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rolecache.toml");
        std::fs::write(&path, "primary_capacity = 42\nconcurrency_level = 4\n").unwrap();

        let config = RoleCacheConfig::from_file(&path).unwrap();
        assert_eq!(config.primary_capacity, 42);
        assert_eq!(config.concurrency_level, 4);

        let missing = RoleCacheConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(RoleCacheError::Config(_))));
    }
}
