//! Rate tables quoted against the base currency.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use voyage_common::Currency;

/// Units of each currency per one unit of the base currency.
///
/// Only strictly positive rates are ever stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateTable(HashMap<Currency, Decimal>);

impl RateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rate. Returns `false` and stores nothing if the rate is not positive.
    pub fn insert(&mut self, currency: Currency, rate: Decimal) -> bool {
        if rate <= Decimal::ZERO {
            return false;
        }
        self.0.insert(currency, rate);
        true
    }

    /// Rate for a currency, if quoted.
    pub fn get(&self, currency: &Currency) -> Option<Decimal> {
        self.0.get(currency).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Currency, Decimal)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (Currency, Decimal)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (currency, rate) in iter {
            table.insert(currency, rate);
        }
        table
    }
}

/// Where a set of rates came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateOrigin {
    /// Fetched from the live provider.
    Live,
    /// The built-in fallback table.
    Fallback,
}

impl fmt::Display for RateOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateOrigin::Live => write!(f, "live"),
            RateOrigin::Fallback => write!(f, "fallback"),
        }
    }
}
