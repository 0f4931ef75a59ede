//! Entry point for storefront and booking code.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use voyage_common::Currency;

use crate::cache::{CacheStatus, RateCache, SharedRateCache};
use crate::config::FxConfig;
use crate::conversion::PaymentConversion;
use crate::engine::ConversionEngine;
use crate::error::FxResult;
use crate::format::PriceFormatter;
use crate::source::RateSource;

/// Cache status plus how the rates are being sourced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateStatus {
    #[serde(flatten)]
    pub cache: CacheStatus,
    /// A provider credential is configured.
    pub live_enabled: bool,
    /// Provider name, or `"fallback"`.
    pub provider: String,
}

/// Currency operations over one explicitly constructed rate cache.
pub struct CurrencyService {
    cache: SharedRateCache,
    engine: Arc<ConversionEngine>,
    formatter: PriceFormatter,
}

impl CurrencyService {
    /// Build a service over an existing cache.
    pub fn new(cache: SharedRateCache) -> Self {
        let engine = Arc::new(ConversionEngine::new(cache.clone()));
        Self {
            formatter: PriceFormatter::new(engine.clone()),
            engine,
            cache,
        }
    }

    /// Build the full stack from configuration.
    pub fn from_config(config: &FxConfig) -> FxResult<Self> {
        config.validate()?;

        let source = RateSource::from_config(config)?;
        let cache = Arc::new(RateCache::with_config(source, config.cache_config()?));

        info!(
            live_enabled = config.has_api_key(),
            ttl_secs = config.cache_ttl.as_secs(),
            "Currency service configured"
        );

        Ok(Self::new(cache))
    }

    pub fn engine(&self) -> &Arc<ConversionEngine> {
        &self.engine
    }

    pub fn format_price(&self, amount: Decimal, currency: &Currency) -> String {
        self.formatter.format(amount, currency)
    }

    pub async fn convert_usd_to_ghs(&self, amount: Decimal) -> Decimal {
        self.engine
            .convert(amount, &Currency::usd(), &Currency::ghs())
            .await
    }

    pub fn convert_usd_to_ghs_sync(&self, amount: Decimal) -> Decimal {
        self.engine
            .convert_offline(amount, &Currency::usd(), &Currency::ghs())
    }

    pub async fn convert_ghs_to_usd(&self, amount: Decimal) -> Decimal {
        self.engine
            .convert(amount, &Currency::ghs(), &Currency::usd())
            .await
    }

    pub fn convert_ghs_to_usd_sync(&self, amount: Decimal) -> Decimal {
        self.engine
            .convert_offline(amount, &Currency::ghs(), &Currency::usd())
    }

    pub async fn format_with_conversion(&self, usd_amount: Decimal) -> String {
        self.formatter.format_with_conversion(usd_amount).await
    }

    pub fn format_with_conversion_sync(&self, usd_amount: Decimal) -> String {
        self.formatter.format_with_conversion_sync(usd_amount)
    }

    pub async fn prepare_payment_conversion(&self, usd_amount: Decimal) -> PaymentConversion {
        self.formatter.prepare_payment_conversion(usd_amount).await
    }

    pub fn prepare_payment_conversion_sync(&self, usd_amount: Decimal) -> PaymentConversion {
        self.formatter.prepare_payment_conversion_sync(usd_amount)
    }

    pub async fn get_exchange_rate(&self, from: &Currency, to: &Currency) -> Decimal {
        self.engine.get_rate(from, to).await
    }

    pub async fn convert_currency(&self, amount: Decimal, from: &Currency, to: &Currency) -> Decimal {
        self.engine.convert(amount, from, to).await
    }

    pub fn cache_status(&self) -> CacheStatus {
        self.cache.status()
    }

    pub fn exchange_rate_status(&self) -> ExchangeRateStatus {
        let source = self.cache.source();
        ExchangeRateStatus {
            cache: self.cache.status(),
            live_enabled: source.is_live(),
            provider: source.provider_name().to_string(),
        }
    }

    /// Drop cached rates so the next lookup refetches.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    fn fallback_service() -> CurrencyService {
        CurrencyService::from_config(&FxConfig::default()).unwrap()
    }

    fn live_config(server: &mockito::Server) -> FxConfig {
        FxConfig {
            api_key: Some("test-key".to_string()),
            endpoint: format!("{}/api/latest.json", server.url()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_provider_error_serves_fallback_rate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/latest.json")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let service = CurrencyService::from_config(&live_config(&server)).unwrap();

        let rate = service
            .get_exchange_rate(&Currency::usd(), &Currency::ghs())
            .await;
        let again = service
            .get_exchange_rate(&Currency::usd(), &Currency::eur())
            .await;

        assert_eq!(rate, dec!(15.5));
        assert_eq!(again, dec!(0.85));
        mock.assert_async().await;

        let status = service.exchange_rate_status();
        assert!(status.live_enabled);
        assert_eq!(status.provider, "openexchangerates");
        assert_eq!(status.cache.origin, Some(crate::RateOrigin::Fallback));
    }

    #[tokio::test]
    async fn test_live_rates_flow_through() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/latest.json")
            .match_query(Matcher::UrlEncoded("app_id".into(), "test-key".into()))
            .with_status(200)
            .with_body(r#"{"base": "USD", "timestamp": 1700000000, "rates": {"GHS": 16, "EUR": 0.8}}"#)
            .create_async()
            .await;
        let service = CurrencyService::from_config(&live_config(&server)).unwrap();

        assert_eq!(service.convert_usd_to_ghs(dec!(50)).await, dec!(800));
        assert_eq!(service.convert_ghs_to_usd(dec!(800)).await, dec!(50));
        assert_eq!(
            service
                .convert_currency(dec!(100), &Currency::eur(), &Currency::ghs())
                .await,
            dec!(2000)
        );
        assert_eq!(
            service.format_with_conversion(dec!(100)).await,
            "$100 (≈ GH₵1,600)"
        );
        assert_eq!(service.cache_status().origin, Some(crate::RateOrigin::Live));
    }

    #[tokio::test]
    async fn test_rates_are_quoted_against_usd() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/latest.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"base": "EUR", "rates": {"GHS": 17.1, "USD": 1.09}}"#)
            .create_async()
            .await;
        let service = CurrencyService::from_config(&live_config(&server)).unwrap();

        // A EUR-based table is rejected rather than reinterpreted.
        assert_eq!(service.convert_usd_to_ghs(dec!(100)).await, dec!(1550));
        assert_eq!(service.cache_status().origin, Some(crate::RateOrigin::Fallback));
    }

    #[tokio::test]
    async fn test_clear_cache_resets_status() {
        let service = fallback_service();

        service.get_exchange_rate(&Currency::usd(), &Currency::ghs()).await;
        assert!(service.exchange_rate_status().cache.cached);

        service.clear_cache();
        assert!(!service.exchange_rate_status().cache.cached);
        assert!(!service.cache_status().cached);

        service.convert_usd_to_ghs(dec!(1)).await;
        assert!(service.cache_status().cached);
    }

    #[test]
    fn test_sync_paths() {
        let service = fallback_service();

        assert_eq!(service.convert_usd_to_ghs_sync(dec!(100)), dec!(1550));
        assert_eq!(service.convert_ghs_to_usd_sync(dec!(1550)), dec!(100));
        assert_eq!(service.format_with_conversion_sync(dec!(100)), "$100 (≈ GH₵1,550)");
        assert_eq!(service.format_price(dec!(1234), &Currency::usd()), "$1,234");
        assert_eq!(service.format_price(dec!(1234), &Currency::ghs()), "GH₵1,234");
        assert!(!service.cache_status().cached);

        let status = service.exchange_rate_status();
        assert!(!status.live_enabled);
        assert_eq!(status.provider, "fallback");
    }

    #[tokio::test]
    async fn test_payment_conversion_fallback_only() {
        let service = fallback_service();

        let live = service.prepare_payment_conversion(dec!(100)).await;
        let sync = service.prepare_payment_conversion_sync(dec!(100));

        assert_eq!(live, sync);
        assert_eq!(live.payment_amount, dec!(1550));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FxConfig {
            cache_ttl: std::time::Duration::ZERO,
            ..Default::default()
        };
        assert!(CurrencyService::from_config(&config).is_err());
    }

    #[test]
    fn test_status_serialises_flat() {
        let json = serde_json::to_value(fallback_service().exchange_rate_status()).unwrap();

        assert_eq!(json["cached"], false);
        assert_eq!(json["liveEnabled"], false);
        assert_eq!(json["provider"], "fallback");
        assert!(json["expiresInSeconds"].is_null());
        assert!(json["lastUpdated"].is_null());
        assert!(json.get("live_enabled").is_none());
    }

    #[tokio::test]
    async fn test_status_keys_after_fetch() {
        let service = fallback_service();
        service.get_exchange_rate(&Currency::usd(), &Currency::ghs()).await;

        let json = serde_json::to_value(service.exchange_rate_status()).unwrap();

        assert_eq!(json["cached"], true);
        assert_eq!(json["origin"], "fallback");
        assert!(json["expiresInSeconds"].as_i64().is_some_and(|secs| secs > 0));
        assert!(json["lastUpdated"].is_string());
    }
}
