//! Price display: symbols, thousands separators, dual-currency strings.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;
use voyage_common::{round_cents, round_whole, Currency, Money};

use crate::conversion::PaymentConversion;
use crate::engine::{apply_rate, ConversionEngine};
use crate::error::FxResult;

/// Render an amount in whole units with its currency symbol, e.g. `GH₵1,550`.
///
/// Unknown currencies are prefixed with their code. Amounts are rounded half
/// away from zero; cents are never shown.
pub fn format_amount(amount: Decimal, currency: &Currency) -> String {
    let whole = round_whole(amount);
    let sign = if whole.is_sign_negative() && !whole.is_zero() {
        "-"
    } else {
        ""
    };
    let symbol = currency.symbol().unwrap_or(currency.code());

    format!("{}{}{}", sign, symbol, group_thousands(&whole.abs().trunc().to_string()))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats prices quoted in a display currency with a local-currency estimate.
pub struct PriceFormatter {
    engine: Arc<ConversionEngine>,
    quote_currency: Currency,
    local_currency: Currency,
}

impl PriceFormatter {
    /// USD prices with a GHS estimate.
    pub fn new(engine: Arc<ConversionEngine>) -> Self {
        Self {
            engine,
            quote_currency: Currency::usd(),
            local_currency: Currency::ghs(),
        }
    }

    pub fn format(&self, amount: Decimal, currency: &Currency) -> String {
        format_amount(amount, currency)
    }

    /// `"$100 (≈ GH₵1,600)"` using live rates. Falls back to the offline rate
    /// if the live rate cannot be resolved.
    pub async fn format_with_conversion(&self, usd_amount: Decimal) -> String {
        match self.live_rate().await {
            Ok(rate) => self.dual(usd_amount, rate),
            Err(e) => {
                warn!(error = %e, "Live conversion failed, formatting with fallback rate");
                self.format_with_conversion_sync(usd_amount)
            }
        }
    }

    /// `"$100 (≈ GH₵1,550)"` using the fallback rate. Never touches the cache.
    pub fn format_with_conversion_sync(&self, usd_amount: Decimal) -> String {
        self.dual(usd_amount, self.offline_rate())
    }

    /// Payment record using live rates, falling back to the offline rate.
    pub async fn prepare_payment_conversion(&self, usd_amount: Decimal) -> PaymentConversion {
        match self.live_rate().await {
            Ok(rate) => self.payment(usd_amount, rate),
            Err(e) => {
                warn!(error = %e, "Live conversion failed, preparing payment with fallback rate");
                self.prepare_payment_conversion_sync(usd_amount)
            }
        }
    }

    /// Payment record using the fallback rate.
    pub fn prepare_payment_conversion_sync(&self, usd_amount: Decimal) -> PaymentConversion {
        self.payment(usd_amount, self.offline_rate())
    }

    async fn live_rate(&self) -> FxResult<Decimal> {
        self.engine
            .resolve_rate(&self.quote_currency, &self.local_currency)
            .await
    }

    fn offline_rate(&self) -> Decimal {
        self.engine
            .offline_rate(&self.quote_currency, &self.local_currency)
    }

    fn dual(&self, amount: Decimal, rate: Decimal) -> String {
        format!(
            "{} (≈ {})",
            format_amount(amount, &self.quote_currency),
            format_amount(apply_rate(amount, rate), &self.local_currency)
        )
    }

    fn payment(&self, amount: Decimal, rate: Decimal) -> PaymentConversion {
        PaymentConversion::new(
            Money::new(amount, self.quote_currency.clone()),
            Money::new(round_cents(apply_rate(amount, rate)), self.local_currency.clone()),
            rate,
        )
    }
}
