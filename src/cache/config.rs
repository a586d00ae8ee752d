//! Configuration for the query context cache

use crate::error::{QueryContextError, Result};
use serde::{Deserialize, Serialize};

/// Default number of query context entries kept per session
pub const DEFAULT_CAPACITY: usize = 5;

/// Environment variable holding the cache capacity
pub const ENV_CACHE_SIZE: &str = "QUERY_CONTEXT_CACHE_SIZE";

/// Environment variable disabling the cache for a session
pub const ENV_DISABLE_CACHE: &str = "DISABLE_QUERY_CONTEXT_CACHE";

/// Session-level configuration for the query context cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContextConfig {
    /// Maximum number of elements kept after a merge round
    pub capacity: usize,

    /// When true, the session never creates a cache and sends no query context
    pub disabled: bool,
}

impl Default for QueryContextConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            disabled: false,
        }
    }
}

impl QueryContextConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> QueryContextConfigBuilder {
        QueryContextConfigBuilder::default()
    }

    /// Load configuration from the environment, reading a `.env` file if present
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let capacity = match std::env::var(ENV_CACHE_SIZE) {
            Ok(raw) => parse_capacity(&raw)?,
            Err(_) => defaults.capacity,
        };
        let disabled = match std::env::var(ENV_DISABLE_CACHE) {
            Ok(raw) => parse_flag(&raw)?,
            Err(_) => defaults.disabled,
        };

        let config = Self { capacity, disabled };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(QueryContextError::ConfigError(
                "capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_capacity(raw: &str) -> Result<usize> {
    raw.trim().parse::<usize>().map_err(|e| {
        QueryContextError::ConfigError(format!("{} must be a positive integer: {}", ENV_CACHE_SIZE, e))
    })
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(QueryContextError::ConfigError(format!(
            "{} must be a boolean, got {:?}",
            ENV_DISABLE_CACHE, other
        ))),
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct QueryContextConfigBuilder {
    capacity: Option<usize>,
    disabled: Option<bool>,
}

impl QueryContextConfigBuilder {
    /// Set the cache capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Disable or enable the cache
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> QueryContextConfig {
        let defaults = QueryContextConfig::default();

        QueryContextConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            disabled: self.disabled.unwrap_or(defaults.disabled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryContextConfig::default();
        assert_eq!(config.capacity, 5);
        assert!(!config.disabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let invalid = QueryContextConfig::builder().capacity(0).build();
        assert!(matches!(
            invalid.validate(),
            Err(QueryContextError::ConfigError(_))
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = QueryContextConfig::builder()
            .capacity(2)
            .disabled(true)
            .build();

        assert_eq!(config.capacity, 2);
        assert!(config.disabled);
    }

    #[test]
    fn test_parse_capacity() {
        assert_eq!(parse_capacity(" 8 ").unwrap(), 8);
        assert!(parse_capacity("-1").is_err());
        assert!(parse_capacity("five").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
