//! Conversion engine: pairwise rates through the base currency.

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};
use voyage_common::{round_cents, Currency, CurrencyPair, Money};

use crate::cache::SharedRateCache;
use crate::error::{FxError, FxResult};
use crate::fallback::{fallback_rate, fallback_table};
use crate::rates::RateTable;

/// Rate of `currency` against `base`: the table, then the fallback table.
fn quote_in(table: &RateTable, base: &Currency, currency: &Currency) -> Option<Decimal> {
    if currency == base {
        return Some(Decimal::ONE);
    }
    table
        .get(currency)
        .or_else(|| fallback_rate(currency))
        .filter(|rate| *rate > Decimal::ZERO)
}

/// Rate converting `from` into `to`, failing if either side is unknown.
pub fn cross_rate(
    table: &RateTable,
    base: &Currency,
    from: &Currency,
    to: &Currency,
) -> FxResult<Decimal> {
    if from == to {
        return Ok(Decimal::ONE);
    }

    match (quote_in(table, base, from), quote_in(table, base, to)) {
        (Some(rate_from), Some(rate_to)) => rate_to.checked_div(rate_from).ok_or_else(|| {
            warn!(from = %from, to = %to, "Cross rate out of range");
            FxError::RateNotAvailable(CurrencyPair::new(from.clone(), to.clone()))
        }),
        _ => Err(FxError::RateNotAvailable(CurrencyPair::new(
            from.clone(),
            to.clone(),
        ))),
    }
}

/// Rate converting `from` into `to`, treating an unknown side as par (1).
///
/// Never fails. An unknown currency silently converts 1:1 against the base,
/// so every defaulted side is logged.
pub fn cross_rate_or_par(
    table: &RateTable,
    base: &Currency,
    from: &Currency,
    to: &Currency,
) -> Decimal {
    if from == to {
        return Decimal::ONE;
    }

    let side = |currency: &Currency| {
        quote_in(table, base, currency).unwrap_or_else(|| {
            warn!(currency = %currency, base = %base, "No rate available, defaulting to 1");
            Decimal::ONE
        })
    };

    side(to).checked_div(side(from)).unwrap_or_else(|| {
        warn!(from = %from, to = %to, "Cross rate out of range, defaulting to 1");
        Decimal::ONE
    })
}

/// `amount * rate`, saturating at the `Decimal` bounds instead of panicking.
pub fn apply_rate(amount: Decimal, rate: Decimal) -> Decimal {
    amount.checked_mul(rate).unwrap_or_else(|| {
        warn!(amount = %amount, rate = %rate, "Converted amount out of range, saturating");
        amount.saturating_mul(rate)
    })
}

/// Answers rate and conversion queries against a shared [`crate::RateCache`].
///
/// Every rate is quoted against USD.
pub struct ConversionEngine {
    cache: SharedRateCache,
    base: Currency,
}

impl ConversionEngine {
    /// Create an engine over the given cache.
    pub fn new(cache: SharedRateCache) -> Self {
        Self {
            cache,
            base: Currency::usd(),
        }
    }

    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    /// Rate for `from` → `to`. Unknown currencies default to a rate of 1.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn get_rate(&self, from: &Currency, to: &Currency) -> Decimal {
        if from == to {
            return Decimal::ONE;
        }

        let rates = self.cache.get_rates().await;
        let rate = cross_rate_or_par(&rates, &self.base, from, to);
        debug!(rate = %rate, "Resolved rate");
        rate
    }

    /// Rate for `from` → `to`, returning an error instead of defaulting.
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub async fn resolve_rate(&self, from: &Currency, to: &Currency) -> FxResult<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }

        let rates = self.cache.get_rates().await;
        cross_rate(&rates, &self.base, from, to)
    }

    /// Convert `amount` and round to cents, half away from zero.
    pub async fn convert(&self, amount: Decimal, from: &Currency, to: &Currency) -> Decimal {
        let rate = self.get_rate(from, to).await;
        round_cents(apply_rate(amount, rate))
    }

    /// Convert a [`Money`] value into another currency.
    pub async fn convert_money(&self, amount: &Money, to: Currency) -> Money {
        let value = self.convert(amount.value, &amount.currency, &to).await;
        Money::new(value, to)
    }

    /// Rate from the fallback table only; never touches the cache.
    pub fn offline_rate(&self, from: &Currency, to: &Currency) -> Decimal {
        cross_rate_or_par(&fallback_table(), &self.base, from, to)
    }

    /// Convert using the fallback table only; never touches the cache.
    pub fn convert_offline(&self, amount: Decimal, from: &Currency, to: &Currency) -> Decimal {
        round_cents(apply_rate(amount, self.offline_rate(from, to)))
    }
}
