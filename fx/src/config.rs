//! FX configuration.

use std::fmt;
use std::time::Duration;

use crate::cache::RateCacheConfig;
use crate::error::{FxError, FxResult};

/// Default live rates endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://openexchangerates.org/api/latest.json";

/// Default snapshot lifetime (one hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Configuration for the exchange-rate layer.
#[derive(Clone)]
pub struct FxConfig {
    /// Provider credential. `None` runs in fallback-only mode.
    pub api_key: Option<String>,
    /// Live rates endpoint.
    pub endpoint: String,
    /// How long a fetched snapshot stays fresh.
    pub cache_ttl: Duration,
    /// Request timeout for the live fetch. `None` leaves the client default.
    pub request_timeout: Option<Duration>,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: None,
        }
    }
}

impl fmt::Debug for FxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FxConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl FxConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.api_key = lookup("EXCHANGE_RATE_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        if let Some(url) = lookup("EXCHANGE_RATE_API_URL") {
            config.endpoint = url;
        }

        if let Some(ttl) = lookup("EXCHANGE_RATE_CACHE_TTL_SECS") {
            if let Ok(secs) = ttl.trim().parse() {
                config.cache_ttl = Duration::from_secs(secs);
            }
        }

        if let Some(timeout) = lookup("EXCHANGE_RATE_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.trim().parse() {
                config.request_timeout = Some(Duration::from_secs(secs));
            }
        }

        config
    }

    /// Whether a live provider credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(FxError::InvalidConfig("Endpoint cannot be empty".to_string()));
        }

        if self.cache_ttl.is_zero() {
            return Err(FxError::InvalidConfig("Cache TTL must be positive".to_string()));
        }

        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(FxError::InvalidConfig(
                "Request timeout must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Cache settings derived from this configuration.
    pub fn cache_config(&self) -> FxResult<RateCacheConfig> {
        let ttl = chrono::Duration::from_std(self.cache_ttl)
            .map_err(|e| FxError::InvalidConfig(format!("Cache TTL out of range: {}", e)))?;
        Ok(RateCacheConfig { ttl })
    }
}
