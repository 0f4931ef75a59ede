//! Fail-open rate source: live provider with fallback.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::FxConfig;
use crate::error::FxResult;
use crate::fallback::fallback_table;
use crate::provider::{HttpRateProvider, RateProvider};
use crate::rates::{RateOrigin, RateTable};

/// Rates returned by a single fetch, tagged with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RateFetch {
    pub rates: RateTable,
    pub origin: RateOrigin,
}

impl RateFetch {
    fn fallback() -> Self {
        Self {
            rates: fallback_table(),
            origin: RateOrigin::Fallback,
        }
    }
}

/// Wraps an optional live provider and never fails.
///
/// Without a provider every fetch returns the fallback table and performs no
/// I/O. Provider errors are logged and replaced by the fallback table. There
/// are no retries; the cache bounds how often this is called.
#[derive(Clone)]
pub struct RateSource {
    provider: Option<Arc<dyn RateProvider>>,
}

impl RateSource {
    /// Source backed by a live provider.
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Source that only ever serves the fallback table.
    pub fn fallback_only() -> Self {
        Self { provider: None }
    }

    /// Build from configuration; no credential means fallback-only.
    pub fn from_config(config: &FxConfig) -> FxResult<Self> {
        Ok(match HttpRateProvider::from_config(config)? {
            Some(provider) => Self::new(Arc::new(provider)),
            None => {
                info!("No exchange rate API key configured, using fallback rates");
                Self::fallback_only()
            }
        })
    }

    /// Whether a live provider is configured.
    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    /// Name of the configured provider, or `"fallback"`.
    pub fn provider_name(&self) -> &str {
        self.provider.as_ref().map_or("fallback", |p| p.name())
    }

    /// Fetch current rates, substituting the fallback table on any failure.
    #[instrument(skip(self), fields(provider = %self.provider_name()))]
    pub async fn fetch_live(&self) -> RateFetch {
        let Some(provider) = &self.provider else {
            debug!("Serving fallback rates");
            return RateFetch::fallback();
        };

        match provider.latest_rates().await {
            Ok(rates) => {
                info!(count = rates.len(), "Fetched live exchange rates");
                RateFetch {
                    rates,
                    origin: RateOrigin::Live,
                }
            }
            Err(e) => {
                warn!(error = %e, "Live rate fetch failed, using fallback rates");
                RateFetch::fallback()
            }
        }
    }
}
