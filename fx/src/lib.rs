//! Voyage FX
//!
//! Exchange-rate cache, currency conversion and price formatting for the
//! Voyage storefront and booking flow.
//!
//! # Features
//!
//! - Live rates from an HTTP provider, with a built-in fallback table
//! - Single-slot rate cache with a one hour TTL and single-flight refresh
//! - Cross rates through the USD base currency
//! - Whole-unit price display and dual-currency strings
//!
//! # Example
//!
//! ```rust,ignore
//! use voyage_fx::{CurrencyService, FxConfig};
//! use voyage_common::Currency;
//! use rust_decimal_macros::dec;
//!
//! let service = CurrencyService::from_config(&FxConfig::from_env())?;
//!
//! let ghs = service.convert_usd_to_ghs(dec!(100)).await;
//! let label = service.format_with_conversion(dec!(100)).await; // "$100 (≈ GH₵1,550)"
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod format;
pub mod provider;
pub mod rates;
pub mod service;
pub mod source;

pub use cache::{CacheStatus, RateCache, RateCacheConfig, RateSnapshot, SharedRateCache};
pub use config::FxConfig;
pub use conversion::PaymentConversion;
pub use engine::{apply_rate, cross_rate, cross_rate_or_par, ConversionEngine};
pub use error::{FxError, FxResult};
pub use fallback::{fallback_rate, fallback_table, FALLBACK_RATES};
pub use format::{format_amount, PriceFormatter};
pub use provider::{HttpRateProvider, RateProvider};
pub use rates::{RateOrigin, RateTable};
pub use service::{CurrencyService, ExchangeRateStatus};
pub use source::{RateFetch, RateSource};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
