//! Monetary types for Voyage pricing.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of minor units (pesewas, cents) in one major unit.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Round a decimal amount to whole cents, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a decimal amount to whole units, half away from zero.
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// A monetary amount in major units with its currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value in major units (cedis, dollars).
    pub value: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Build from an integer count of minor units (e.g. pesewas).
    pub fn from_minor_units(minor: i64, currency: Currency) -> Self {
        Self {
            value: Decimal::new(minor, 2),
            currency,
        }
    }

    /// Convert to an integer count of minor units, rounding half away from zero.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    pub fn to_minor_units(&self) -> Option<i64> {
        round_cents(self.value)
            .checked_mul(Decimal::from(MINOR_UNITS_PER_MAJOR))?
            .trunc()
            .to_i64()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// ISO 4217 currency code, normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Display symbol for the currencies shown in the storefront.
    pub fn symbol(&self) -> Option<&'static str> {
        match self.0.as_str() {
            "USD" => Some("$"),
            "GHS" => Some("GH₵"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "CAD" => Some("C$"),
            _ => None,
        }
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn ghs() -> Self {
        Self::new("GHS")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn cad() -> Self {
        Self::new("CAD")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A currency pair for FX operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Currency being converted from.
    pub base: Currency,
    /// Currency being converted into.
    pub quote: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
