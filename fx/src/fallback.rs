//! Built-in rates used when the live provider is unavailable.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use voyage_common::Currency;

use crate::rates::RateTable;

/// Default rates per 1 USD.
pub const FALLBACK_RATES: [(&str, Decimal); 4] = [
    ("GHS", dec!(15.5)),
    ("EUR", dec!(0.85)),
    ("GBP", dec!(0.73)),
    ("CAD", dec!(1.25)),
];

/// The fallback rates as a table.
pub fn fallback_table() -> RateTable {
    FALLBACK_RATES
        .iter()
        .map(|(code, rate)| (Currency::new(*code), *rate))
        .collect()
}

/// Fallback rate for a single currency.
pub fn fallback_rate(currency: &Currency) -> Option<Decimal> {
    FALLBACK_RATES
        .iter()
        .find(|(code, _)| *code == currency.code())
        .map(|(_, rate)| *rate)
}
