//! Engine configuration shared read-only by every adapter.
//!
//! # Examples
//!
//! ```
//! use trawl::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! assert_eq!(config.slow_query_threshold_ms, 10);
//! assert_eq!(config.very_slow_query_threshold_ms, 100);
//! assert_eq!(config.default_max_results, 100);
//!
//! let tuned = EngineConfig::from_json_str(r#"{"slow_query_threshold_ms": 250}"#).unwrap();
//! assert_eq!(tuned.slow_query_threshold_ms, 250);
//! assert_eq!(tuned.readers_field, "readers");
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrawlError};

/// Configuration for query execution.
///
/// The latency thresholds default to tiny values; production deployments are
/// expected to override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Queries slower than this are logged at WARN.
    pub slow_query_threshold_ms: u64,

    /// Queries slower than this are logged at ERROR.
    pub very_slow_query_threshold_ms: u64,

    /// Size of the probe scan used to estimate direct-store totals.
    pub default_max_results: usize,

    /// Full-text field holding the item path.
    pub path_field: String,

    /// Full-text field holding the reader list.
    pub readers_field: String,

    /// Principal used for unauthenticated callers.
    pub anonymous_principal: String,

    /// Superuser principal; bypasses reader filtering.
    pub admin_principal: String,

    /// Pseudo-group every principal belongs to.
    pub everyone_principal: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            slow_query_threshold_ms: 10,
            very_slow_query_threshold_ms: 100,
            default_max_results: 100,
            path_field: "path".to_string(),
            readers_field: "readers".to_string(),
            anonymous_principal: "anonymous".to_string(),
            admin_principal: "admin".to_string(),
            everyone_principal: "everyone".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.very_slow_query_threshold_ms < self.slow_query_threshold_ms {
            return Err(TrawlError::invalid_config(format!(
                "very_slow_query_threshold_ms ({}) is below slow_query_threshold_ms ({})",
                self.very_slow_query_threshold_ms, self.slow_query_threshold_ms
            )));
        }
        if self.default_max_results == 0 {
            return Err(TrawlError::invalid_config(
                "default_max_results must be greater than 0",
            ));
        }
        for (name, value) in [
            ("path_field", &self.path_field),
            ("readers_field", &self.readers_field),
            ("anonymous_principal", &self.anonymous_principal),
            ("admin_principal", &self.admin_principal),
            ("everyone_principal", &self.everyone_principal),
        ] {
            if value.trim().is_empty() {
                return Err(TrawlError::invalid_config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    /// Slow threshold as a duration.
    pub fn slow_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_query_threshold_ms)
    }

    /// Very slow threshold as a duration.
    pub fn very_slow_threshold(&self) -> Duration {
        Duration::from_millis(self.very_slow_query_threshold_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.slow_threshold(), Duration::from_millis(10));
        assert_eq!(config.very_slow_threshold(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"default_max_results": 500, "admin_principal": "root"}"#)
                .unwrap();
        assert_eq!(config.default_max_results, 500);
        assert_eq!(config.admin_principal, "root");
        assert_eq!(config.slow_query_threshold_ms, 10);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let result = EngineConfig::from_json_str(
            r#"{"slow_query_threshold_ms": 500, "very_slow_query_threshold_ms": 100}"#,
        );
        assert!(matches!(result, Err(TrawlError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_probe_size_rejected() {
        let config = EngineConfig {
            default_max_results: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"very_slow_query_threshold_ms": 2000}}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.very_slow_query_threshold_ms, 2000);
    }

    #[test]
    fn test_missing_file() {
        let result = EngineConfig::from_file("/nonexistent/trawl.json");
        assert!(matches!(result, Err(TrawlError::Io(_))));
    }
}
