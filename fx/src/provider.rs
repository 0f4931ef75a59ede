//! Rate provider trait and the HTTP implementation.

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};
use voyage_common::Currency;

use crate::config::FxConfig;
use crate::error::{FxError, FxResult};
use crate::rates::RateTable;

/// Trait for live FX rate providers.
///
/// Implementations are strict: any failure is returned as an error. Turning
/// failures into fallback rates is the job of [`crate::RateSource`].
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the latest rates quoted against the base currency.
    async fn latest_rates(&self) -> FxResult<RateTable>;
}

/// Body of a `latest.json` response.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    rates: Option<HashMap<String, serde_json::Value>>,
}

/// Open Exchange Rates style HTTP provider.
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    base: Currency,
}

impl HttpRateProvider {
    /// Create a provider for the given endpoint and credential.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        base: Currency,
        timeout: Option<Duration>,
    ) -> FxResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            base,
        })
    }

    /// Build a provider from configuration. Returns `None` without a credential.
    pub fn from_config(config: &FxConfig) -> FxResult<Option<Self>> {
        match &config.api_key {
            Some(key) => Self::new(
                config.endpoint.clone(),
                key.clone(),
                Currency::usd(),
                config.request_timeout,
            )
            .map(Some),
            None => Ok(None),
        }
    }

    fn parse_body(&self, body: &str) -> FxResult<RateTable> {
        let payload: LatestRatesResponse = serde_json::from_str(body)
            .map_err(|e| FxError::MalformedPayload(e.to_string()))?;

        if let Some(base) = payload.base.as_deref() {
            if Currency::new(base) != self.base {
                return Err(FxError::MalformedPayload(format!(
                    "expected base {}, got {}",
                    self.base, base
                )));
            }
        }

        let raw = payload
            .rates
            .ok_or_else(|| FxError::MalformedPayload("missing rates object".to_string()))?;

        let mut table = RateTable::new();
        for (code, value) in raw {
            let rate = value
                .as_f64()
                .filter(|r| r.is_finite())
                .and_then(Decimal::from_f64);

            let inserted = rate.is_some_and(|rate| table.insert(Currency::new(&code), rate));
            if !inserted {
                debug!(currency = %code, value = %value, "Skipping unusable rate");
            }
        }

        if table.is_empty() {
            return Err(FxError::MalformedPayload("rates object is empty".to_string()));
        }

        debug!(
            count = table.len(),
            provider_timestamp = ?payload.timestamp,
            "Parsed live rates"
        );

        Ok(table)
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "openexchangerates"
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn latest_rates(&self) -> FxResult<RateTable> {
        // The query carries the credential; keep it out of error messages.
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("app_id", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| FxError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FxError::UnexpectedStatus(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FxError::Http(e.without_url()))?;
        self.parse_body(&body)
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: parking_lot::Mutex<Option<RateTable>>,
    calls: std::sync::atomic::AtomicUsize,
    delay: Option<Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider that fails until rates are set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Create a provider serving the given rates.
    pub fn with_rates(name: impl Into<String>, rates: RateTable) -> Self {
        let provider = Self::new(name);
        provider.set_rates(Some(rates));
        provider
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the served rates. `None` makes the provider fail.
    pub fn set_rates(&self, rates: Option<RateTable>) {
        *self.rates.lock() = rates;
    }

    /// Number of fetches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn latest_rates(&self) -> FxResult<RateTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.rates
            .lock()
            .clone()
            .ok_or(FxError::UnexpectedStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}
