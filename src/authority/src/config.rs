//! Service configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Engine-facing settings
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bounded wait for a whole request; `None` waits forever
    pub request_timeout: Option<Duration>,

    /// Reject cyclic mapping graphs up front instead of letting them hang
    pub detect_mapping_cycles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(300)),
            detect_mapping_cycles: false,
        }
    }
}

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Server bind address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// JSON connection registry
    pub registry_path: PathBuf,

    /// Worker tasks draining the mapping queue
    pub mapping_workers: usize,

    /// Worker tasks draining the authority queue
    pub authority_workers: usize,

    /// Request timeout in seconds, `0` disables it
    pub request_timeout_secs: u64,

    /// See [`EngineConfig::detect_mapping_cycles`]
    pub detect_mapping_cycles: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8345,
            log_level: "info".to_string(),
            registry_path: PathBuf::from("registry.json"),
            mapping_workers: 10,
            authority_workers: 10,
            request_timeout_secs: 300,
            detect_mapping_cycles: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl ServiceConfig {
    /// Defaults overridden by environment variables
    ///
    /// - `HOST`, `PORT`, `LOG_LEVEL`
    /// - `ACLGATE_REGISTRY`
    /// - `MAPPING_WORKERS`, `AUTHORITY_WORKERS`
    /// - `REQUEST_TIMEOUT_SECS`
    /// - `DETECT_MAPPING_CYCLES`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            registry_path: std::env::var("ACLGATE_REGISTRY")
                .map(PathBuf::from)
                .unwrap_or(defaults.registry_path),
            mapping_workers: env_parse("MAPPING_WORKERS").unwrap_or(defaults.mapping_workers),
            authority_workers: env_parse("AUTHORITY_WORKERS")
                .unwrap_or(defaults.authority_workers),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            detect_mapping_cycles: env_parse("DETECT_MAPPING_CYCLES")
                .unwrap_or(defaults.detect_mapping_cycles),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            request_timeout: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
            detect_mapping_cycles: self.detect_mapping_cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_disables_bound() {
        let config = ServiceConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.engine_config().request_timeout.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{ "port": 9000, "detect_mapping_cycles": true }"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.engine_config().detect_mapping_cycles);
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }
}
