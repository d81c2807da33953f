//! Configuration Module
//!
//! Loads process configuration from environment variables once at startup.
//! Values are validated here and never change afterwards.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::upstream::documents::DEFAULT_DOCUMENTS_BASE_URL;

pub const DEFAULT_CACHE_TTL: u64 = 300;
pub const DEFAULT_MAX_ENTRIES: usize = 1000;
pub const DEFAULT_API_BASE_URL: &str = "https://wslwebservices.leg.wa.gov";
pub const DEFAULT_SEARCH_URL: &str = "https://search.leg.wa.gov/api/search";
pub const DEFAULT_SERVER_NAME: &str = "Washington State Legislature Tool Server";

// == Cache Config ==
/// Bounds for a [`CacheStore`](crate::cache::CacheStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    ttl_seconds: u64,
    max_entries: usize,
}

impl CacheConfig {
    /// Validates and builds cache bounds. Both values must be positive.
    pub fn new(ttl_seconds: u64, max_entries: usize) -> Result<Self, ConfigError> {
        if ttl_seconds == 0 {
            return Err(ConfigError::Invalid {
                field: "ttl_seconds",
                reason: "must be greater than zero".to_string(),
            });
        }
        if max_entries == 0 {
            return Err(ConfigError::Invalid {
                field: "max_entries",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            ttl_seconds,
            max_entries,
        })
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CACHE_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Server configuration parameters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache bounds
    pub cache: CacheConfig,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Timeout for each upstream attempt, in seconds
    pub api_timeout: u64,
    /// Upstream attempts per fetch, first try included
    pub max_attempts: u32,
    /// First retry delay in milliseconds
    pub backoff_base_ms: u64,
    /// Retry delay cap in milliseconds
    pub backoff_max_ms: u64,
    /// Root URL of the legislative web service
    pub api_base_url: String,
    /// Root URL of the bill document file server
    pub documents_base_url: String,
    /// Full URL of the full-text search method
    pub search_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Name reported by the health endpoint
    pub server_name: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `WSL_CACHE_TTL` - Entry lifetime in seconds (default: 300)
    /// - `WSL_CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `WSL_CACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `WSL_API_TIMEOUT` - Per-attempt upstream timeout in seconds (default: 30)
    /// - `WSL_API_MAX_ATTEMPTS` - Upstream attempts per fetch (default: 3)
    /// - `WSL_API_BACKOFF_BASE_MS` - First retry delay (default: 500)
    /// - `WSL_API_BACKOFF_MAX_MS` - Retry delay cap (default: 8000)
    /// - `WSL_API_BASE_URL` - Upstream root URL
    /// - `WSL_DOCUMENTS_BASE_URL` - Bill document file server root
    /// - `WSL_SEARCH_URL` - Full-text search method
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SERVER_NAME` - Name reported by `/health`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache = CacheConfig::new(
            parse_var(&lookup, "WSL_CACHE_TTL", defaults.cache.ttl_seconds())?,
            parse_var(&lookup, "WSL_CACHE_MAX_ENTRIES", defaults.cache.max_entries())?,
        )?;

        let config = Self {
            cache,
            cleanup_interval: parse_var(
                &lookup,
                "WSL_CACHE_CLEANUP_INTERVAL",
                defaults.cleanup_interval,
            )?,
            api_timeout: parse_var(&lookup, "WSL_API_TIMEOUT", defaults.api_timeout)?,
            max_attempts: parse_var(&lookup, "WSL_API_MAX_ATTEMPTS", defaults.max_attempts)?,
            backoff_base_ms: parse_var(
                &lookup,
                "WSL_API_BACKOFF_BASE_MS",
                defaults.backoff_base_ms,
            )?,
            backoff_max_ms: parse_var(&lookup, "WSL_API_BACKOFF_MAX_MS", defaults.backoff_max_ms)?,
            api_base_url: lookup("WSL_API_BASE_URL").unwrap_or(defaults.api_base_url),
            documents_base_url: lookup("WSL_DOCUMENTS_BASE_URL")
                .unwrap_or(defaults.documents_base_url),
            search_url: lookup("WSL_SEARCH_URL").unwrap_or(defaults.search_url),
            server_port: parse_var(&lookup, "SERVER_PORT", defaults.server_port)?,
            server_name: lookup("SERVER_NAME").unwrap_or(defaults.server_name),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("cleanup_interval", self.cleanup_interval),
            ("api_timeout", self.api_timeout),
            ("max_attempts", u64::from(self.max_attempts)),
            ("backoff_base_ms", self.backoff_base_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        if self.backoff_max_ms < self.backoff_base_ms {
            return Err(ConfigError::Invalid {
                field: "backoff_max_ms",
                reason: format!("must be at least backoff_base_ms ({})", self.backoff_base_ms),
            });
        }

        let urls = [
            ("api_base_url", &self.api_base_url),
            ("documents_base_url", &self.documents_base_url),
            ("search_url", &self.search_url),
        ];
        for (field, url) in urls {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            cleanup_interval: 60,
            api_timeout: 30,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 8000,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            documents_base_url: DEFAULT_DOCUMENTS_BASE_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            server_port: 3000,
            server_name: DEFAULT_SERVER_NAME.to_string(),
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Parse {
            var: var.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.ttl_seconds(), 300);
        assert_eq!(config.cache.max_entries(), 1000);
        assert_eq!(config.api_timeout, 30);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_config_from_lookup_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("WSL_CACHE_TTL", "120"),
            ("WSL_CACHE_MAX_ENTRIES", "50"),
            ("WSL_API_MAX_ATTEMPTS", "5"),
            ("WSL_API_BASE_URL", "http://localhost:9000"),
            ("WSL_SEARCH_URL", "http://localhost:9001/search"),
        ]))
        .unwrap();

        assert_eq!(config.cache.ttl_seconds(), 120);
        assert_eq!(config.cache.max_entries(), 50);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.search_url, "http://localhost:9001/search");
        assert_eq!(config.documents_base_url, DEFAULT_DOCUMENTS_BASE_URL);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let result = Config::from_lookup(lookup_from(&[("WSL_CACHE_TTL", "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "ttl_seconds", .. })
        ));
    }

    #[test]
    fn test_negative_capacity_is_parse_error() {
        let result = Config::from_lookup(lookup_from(&[("WSL_CACHE_MAX_ENTRIES", "-5")]));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_backoff_cap_below_base_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("WSL_API_BACKOFF_BASE_MS", "1000"),
            ("WSL_API_BACKOFF_MAX_MS", "10"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "backoff_max_ms", .. })
        ));
    }

    #[test]
    fn test_blank_search_url_rejected() {
        let result = Config::from_lookup(lookup_from(&[("WSL_SEARCH_URL", "  ")]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { field: "search_url", .. })
        ));
    }

    #[test]
    fn test_cache_config_rejects_zero_values() {
        assert!(CacheConfig::new(0, 10).is_err());
        assert!(CacheConfig::new(10, 0).is_err());
        assert!(CacheConfig::new(10, 10).is_ok());
    }
}
