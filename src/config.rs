//! # Configuration Module
//!
//! Application settings loaded from the environment (and an optional `.env`
//! file), plus the explicit configuration handed to the recipe provider
//! client at construction.

use anyhow::{Context, Result};
use log::{info, warn};
use std::env;

pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.spoonacular.com";
pub const SEARCH_TIMEOUT_SECS: u64 = 10;
pub const DETAIL_TIMEOUT_SECS: u64 = 15;

/// Retry and circuit breaker settings for provider calls
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retry attempts after the first call
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Consecutive failures before the circuit opens
    pub circuit_breaker_threshold: u32,
    /// Seconds before an open circuit lets calls through again
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_retry_delay_ms: 500,
            max_retry_delay_ms: 5000,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60,
        }
    }
}

/// Settings for the external recipe provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider API key; calls are refused when absent
    pub api_key: Option<String>,
    pub base_url: String,
    pub search_timeout_secs: u64,
    pub detail_timeout_secs: u64,
    pub recovery: RecoveryConfig,
}

impl ProviderConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Self::default()
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            search_timeout_secs: SEARCH_TIMEOUT_SECS,
            detail_timeout_secs: DETAIL_TIMEOUT_SECS,
            recovery: RecoveryConfig::default(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string; only commands that touch storage need it
    pub database_url: Option<String>,
    pub provider: ProviderConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// Reads a `.env` file first if one exists. The provider key is read from
    /// `SPOONACULAR_API_KEY`, falling back to `SPOONACULAR_KEY`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok());

        info!(
            "Configuration loaded (provider base URL: {})",
            config.provider.base_url
        );
        config
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = non_empty("DATABASE_URL");

        let api_key = non_empty("SPOONACULAR_API_KEY").or_else(|| non_empty("SPOONACULAR_KEY"));
        if api_key.is_none() {
            warn!("No recipe provider API key configured; provider calls will fail");
        }

        let base_url = non_empty("SPOONACULAR_BASE_URL")
            .unwrap_or_else(|| DEFAULT_PROVIDER_BASE_URL.to_string());

        Self {
            database_url,
            provider: ProviderConfig {
                api_key,
                base_url: base_url.trim_end_matches('/').to_string(),
                ..ProviderConfig::default()
            },
        }
    }

    /// Connection string for commands that open a database pool
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/meals")]));
        assert_eq!(config.database_url().unwrap(), "postgres://localhost/meals");
        assert_eq!(config.provider.api_key, None);
        assert_eq!(config.provider.base_url, DEFAULT_PROVIDER_BASE_URL);
        assert_eq!(config.provider.recovery.max_retries, 3);
    }

    #[test]
    fn test_api_key_fallback() {
        let config = AppConfig::from_lookup(
            lookup(&[("SPOONACULAR_KEY", "fallback")]),
        );
        assert_eq!(config.provider.api_key.as_deref(), Some("fallback"));

        let config = AppConfig::from_lookup(
            lookup(&[("SPOONACULAR_API_KEY", "primary"), ("SPOONACULAR_KEY", "fallback")]),
        );
        assert_eq!(config.provider.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let config = AppConfig::from_lookup(
            lookup(&[("SPOONACULAR_API_KEY", "  "), ("SPOONACULAR_KEY", "fallback")]),
        );
        assert_eq!(config.provider.api_key.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_base_url_override() {
        let config = AppConfig::from_lookup(
            lookup(&[("SPOONACULAR_BASE_URL", "http://127.0.0.1:9000/")]),
        );
        assert_eq!(config.provider.base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_provider_config_without_database() {
        let config = AppConfig::from_lookup(lookup(&[("SPOONACULAR_API_KEY", "key")]));

        assert_eq!(config.database_url, None);
        assert!(config.database_url().is_err());
        assert_eq!(config.provider.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn test_blank_database_url_is_missing() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", " ")]));
        assert!(config.database_url().is_err());
    }
}
