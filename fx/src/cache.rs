//! Single-slot exchange-rate cache with TTL.

use chrono::Duration;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use voyage_common::{is_expired, now, seconds_until, Timestamp};

use crate::rates::{RateOrigin, RateTable};
use crate::source::{RateFetch, RateSource};

/// A set of rates together with its freshness window.
#[derive(Debug, Clone)]
pub struct RateSnapshot {
    /// Rates per 1 unit of the base currency.
    pub rates: Arc<RateTable>,
    /// When the rates were obtained.
    pub fetched_at: Timestamp,
    /// When the rates stop being fresh.
    pub expires_at: Timestamp,
    /// Live provider or fallback table.
    pub origin: RateOrigin,
}

impl RateSnapshot {
    fn new(fetch: RateFetch, ttl: Duration) -> Self {
        let fetched_at = now();
        Self {
            rates: Arc::new(fetch.rates),
            fetched_at,
            expires_at: fetched_at + ttl,
            origin: fetch.origin,
        }
    }

    /// Valid while the current time is before `expires_at`.
    pub fn is_fresh(&self) -> bool {
        !is_expired(self.expires_at)
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// Lifetime of a snapshot. Must be positive.
    pub ttl: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(3600),
        }
    }
}

/// Read-only view of the cache state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    /// A fresh snapshot is held.
    pub cached: bool,
    /// Seconds until the held snapshot expires, when fresh.
    pub expires_in_seconds: Option<i64>,
    /// When the held snapshot was fetched, fresh or not.
    pub last_updated: Option<Timestamp>,
    /// Origin of the held snapshot.
    pub origin: Option<RateOrigin>,
}

/// Holds at most one rate snapshot and refreshes it from a [`RateSource`].
///
/// Refreshes are single-flight: concurrent callers that miss wait for the
/// in-progress fetch instead of issuing their own. Callers hitting a fresh
/// snapshot never wait on a refresh.
pub struct RateCache {
    source: RateSource,
    slot: RwLock<Option<Arc<RateSnapshot>>>,
    refresh: Mutex<()>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new(source: RateSource) -> Self {
        Self::with_config(source, RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(source: RateSource, config: RateCacheConfig) -> Self {
        Self {
            source,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
            config,
        }
    }

    /// The source this cache refreshes from.
    pub fn source(&self) -> &RateSource {
        &self.source
    }

    /// Current rates, fetching if the held snapshot is absent or stale.
    pub async fn get_rates(&self) -> Arc<RateTable> {
        if let Some(rates) = self.fresh_rates() {
            debug!("Cache hit");
            return rates;
        }

        let _guard = self.refresh.lock().await;

        // Another caller may have refreshed while we waited.
        if let Some(rates) = self.fresh_rates() {
            debug!("Cache refreshed by concurrent caller");
            return rates;
        }

        debug!("Cache miss");
        let fetch = self.source.fetch_live().await;
        let snapshot = Arc::new(RateSnapshot::new(fetch, self.config.ttl));
        let rates = snapshot.rates.clone();

        info!(
            origin = %snapshot.origin,
            count = rates.len(),
            expires_at = %snapshot.expires_at,
            "Cached exchange rates"
        );

        *self.slot.write() = Some(snapshot);
        rates
    }

    /// The held snapshot, fresh or stale, without fetching.
    pub fn snapshot(&self) -> Option<Arc<RateSnapshot>> {
        self.slot.read().clone()
    }

    /// Discard the held snapshot.
    pub fn clear(&self) {
        *self.slot.write() = None;
        debug!("Cache cleared");
    }

    /// Describe the cache state without fetching.
    pub fn status(&self) -> CacheStatus {
        match self.snapshot() {
            Some(snapshot) => {
                let fresh = snapshot.is_fresh();
                CacheStatus {
                    cached: fresh,
                    expires_in_seconds: fresh.then(|| seconds_until(snapshot.expires_at)),
                    last_updated: Some(snapshot.fetched_at),
                    origin: Some(snapshot.origin),
                }
            }
            None => CacheStatus {
                cached: false,
                expires_in_seconds: None,
                last_updated: None,
                origin: None,
            },
        }
    }

    fn fresh_rates(&self) -> Option<Arc<RateTable>> {
        self.slot
            .read()
            .as_ref()
            .filter(|snapshot| snapshot.is_fresh())
            .map(|snapshot| snapshot.rates.clone())
    }
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_table;
    use crate::provider::MockRateProvider;
    use rust_decimal_macros::dec;
    use std::time::Duration as StdDuration;
    use voyage_common::Currency;

    fn live_rates() -> RateTable {
        vec![(Currency::ghs(), dec!(16.1)), (Currency::eur(), dec!(0.9))]
            .into_iter()
            .collect()
    }

    fn cache_with(provider: Arc<MockRateProvider>, ttl: Duration) -> RateCache {
        RateCache::with_config(RateSource::new(provider), RateCacheConfig { ttl })
    }

    #[tokio::test]
    async fn test_cache_hit_returns_same_snapshot() {
        let provider = Arc::new(MockRateProvider::with_rates("mock", live_rates()));
        let cache = cache_with(provider.clone(), Duration::seconds(3600));

        let first = cache.get_rates().await;
        let second = cache.get_rates().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_one_fetch() {
        let provider = Arc::new(MockRateProvider::with_rates("mock", live_rates()));
        let cache = cache_with(provider.clone(), Duration::milliseconds(50));

        let first = cache.get_rates().await;
        assert_eq!(provider.calls(), 1);

        tokio::time::sleep(StdDuration::from_millis(60)).await;

        let second = cache.get_rates().await;
        let third = cache.get_rates().await;

        assert_eq!(provider.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[tokio::test]
    async fn test_refresh_replaces_snapshot_wholesale() {
        let provider = Arc::new(MockRateProvider::with_rates("mock", live_rates()));
        let cache = cache_with(provider.clone(), Duration::seconds(3600));

        cache.get_rates().await;
        assert_eq!(cache.snapshot().unwrap().origin, RateOrigin::Live);

        provider.set_rates(None);
        cache.clear();
        let rates = cache.get_rates().await;

        assert_eq!(*rates, fallback_table());
        assert_eq!(rates.get(&Currency::eur()), Some(dec!(0.85)));
        assert_eq!(cache.snapshot().unwrap().origin, RateOrigin::Fallback);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let provider = Arc::new(
            MockRateProvider::with_rates("slow", live_rates())
                .with_delay(StdDuration::from_millis(20)),
        );
        let cache = cache_with(provider.clone(), Duration::seconds(3600));

        let (a, b, c) = tokio::join!(cache.get_rates(), cache.get_rates(), cache.get_rates());

        assert_eq!(provider.calls(), 1);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&b, &c));
    }

    #[tokio::test]
    async fn test_clear_and_status() {
        let cache = RateCache::new(RateSource::fallback_only());

        let empty = cache.status();
        assert!(!empty.cached);
        assert_eq!(empty.expires_in_seconds, None);
        assert_eq!(empty.last_updated, None);

        cache.get_rates().await;
        let status = cache.status();
        assert!(status.cached);
        assert_eq!(status.origin, Some(RateOrigin::Fallback));
        assert!(status.last_updated.is_some());
        let expires_in = status.expires_in_seconds.unwrap();
        assert!(expires_in > 3590 && expires_in <= 3600);

        cache.clear();
        assert!(!cache.status().cached);
        assert!(cache.snapshot().is_none());

        cache.get_rates().await;
        assert!(cache.status().cached);
    }

    #[tokio::test]
    async fn test_status_serialises_camel_case() {
        let cache = RateCache::new(RateSource::fallback_only());
        cache.get_rates().await;

        let json = serde_json::to_value(cache.status()).unwrap();

        assert_eq!(json["cached"], true);
        assert!(json["expiresInSeconds"].is_i64());
        assert!(json["lastUpdated"].is_string());
        assert_eq!(json["origin"], "fallback");
        assert!(json.get("expires_in_seconds").is_none());
    }

    #[tokio::test]
    async fn test_stale_snapshot_status() {
        let provider = Arc::new(MockRateProvider::with_rates("mock", live_rates()));
        let cache = cache_with(provider, Duration::milliseconds(10));

        cache.get_rates().await;
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        let status = cache.status();
        assert!(!status.cached);
        assert_eq!(status.expires_in_seconds, None);
        assert!(status.last_updated.is_some());
    }

    #[test]
    fn test_snapshot_window() {
        let snapshot = RateSnapshot::new(
            RateFetch {
                rates: fallback_table(),
                origin: RateOrigin::Fallback,
            },
            Duration::seconds(3600),
        );

        assert!(snapshot.expires_at > snapshot.fetched_at);
        assert_eq!(snapshot.expires_at - snapshot.fetched_at, Duration::seconds(3600));
        assert!(snapshot.is_fresh());
    }
}
