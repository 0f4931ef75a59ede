//! Payment conversion records handed to booking and payment collaborators.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use voyage_common::{Currency, CurrencyPair, Money};

use crate::format::format_amount;

/// A priced amount converted into the currency it will be charged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConversion {
    /// Amount as quoted to the customer.
    pub original_amount: Decimal,
    pub original_currency: Currency,
    /// Amount to charge, rounded to cents.
    pub payment_amount: Decimal,
    pub payment_currency: Currency,
    /// Rate used: payment units per original unit.
    pub exchange_rate: Decimal,
    /// Human readable summary.
    pub conversion_info: String,
}

impl PaymentConversion {
    /// Build a record and its summary line.
    pub fn new(original: Money, payment: Money, exchange_rate: Decimal) -> Self {
        let conversion_info = format!(
            "{} {} = {} {} (Rate: 1 {} = {:.2} {})",
            format_amount(original.value, &original.currency),
            original.currency,
            format_amount(payment.value, &payment.currency),
            payment.currency,
            original.currency,
            exchange_rate,
            payment.currency,
        );

        Self {
            original_amount: original.value,
            original_currency: original.currency,
            payment_amount: payment.value,
            payment_currency: payment.currency,
            exchange_rate,
            conversion_info,
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.original_currency.clone(), self.payment_currency.clone())
    }

    /// Amount to charge in minor units (pesewas, cents).
    pub fn payment_minor_units(&self) -> Option<i64> {
        Money::new(self.payment_amount, self.payment_currency.clone()).to_minor_units()
    }
}
